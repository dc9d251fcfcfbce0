use std::{cell::RefCell, rc::Rc};

use async_trait::async_trait;
use futures_channel::oneshot;

use crate::{GraphQLRequest, GraphQLResponse, QueryError, Transport};

type Outcome = Result<GraphQLResponse, QueryError>;
type Responder = Box<dyn Fn(&GraphQLRequest) -> Outcome>;

/// In-memory transport that records every request.
///
/// Either answers immediately through a responder, or parks each request until
/// the test calls [`MockTransport::respond`].
#[derive(Clone)]
pub(crate) struct MockTransport {
    inner: Rc<RefCell<MockState>>,
}

struct MockState {
    requests: Vec<GraphQLRequest>,
    parked: Vec<Option<oneshot::Sender<Outcome>>>,
    responder: Option<Responder>,
}

impl MockTransport {
    pub(crate) fn manual() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MockState {
                requests: Vec::new(),
                parked: Vec::new(),
                responder: None,
            })),
        }
    }

    pub(crate) fn responding(responder: impl Fn(&GraphQLRequest) -> Outcome + 'static) -> Self {
        let transport = Self::manual();
        transport.inner.borrow_mut().responder = Some(Box::new(responder));
        transport
    }

    pub(crate) fn requests(&self) -> Vec<GraphQLRequest> {
        self.inner.borrow().requests.clone()
    }

    /// Answers the `index`-th request. Ignored if its caller stopped listening.
    pub(crate) fn respond(&self, index: usize, outcome: Outcome) {
        let sender = self
            .inner
            .borrow_mut()
            .parked
            .get_mut(index)
            .and_then(Option::take);
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn execute(&self, request: &GraphQLRequest) -> Result<GraphQLResponse, QueryError> {
        let receiver = {
            let mut state = self.inner.borrow_mut();
            state.requests.push(request.clone());
            if let Some(responder) = state.responder.as_ref() {
                return responder(request);
            }
            let (sender, receiver) = oneshot::channel();
            state.parked.push(Some(sender));
            receiver
        };

        receiver
            .await
            .unwrap_or_else(|_| Err(QueryError::Transport("mock response dropped".into())))
    }
}
