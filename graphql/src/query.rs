use std::{
    cell::{Cell, RefCell},
    future::Future,
    rc::Rc,
};

use futures_channel::oneshot;
use leptos::logging;
use slotmap::{new_key_type, SlotMap};

use crate::{
    ErrorPolicy, GraphQLRequest, GraphQLResponse, Instant, QueryData, QueryError, QueryOptions,
    QueryState, QueryValue, Transport, TypedDocument, VariablesSnapshot,
};

new_key_type! {
    pub(crate) struct ListenerKey;
}

type Listener<V> = Box<dyn Fn(&QueryState<V>)>;

// The request whose response may still commit.
struct InFlight {
    seq: u64,
    cancel: oneshot::Sender<()>,
}

/// State behind one query accessor.
///
/// Every request gets the next sequence number. A response commits only if it
/// belongs to the newest request and nothing newer has committed, so the order
/// responses arrive in never matters.
#[derive(Clone)]
pub(crate) struct Query<V> {
    template: Rc<GraphQLRequest>,
    transport: Rc<dyn Transport>,
    keep_previous_data: bool,
    error_policy: ErrorPolicy,

    // State
    state: Rc<Cell<QueryState<V>>>,
    snapshot: Rc<RefCell<Option<VariablesSnapshot>>>,

    // Ordering & cancellation
    issued: Rc<Cell<u64>>,
    applied: Rc<Cell<u64>>,
    settled: Rc<Cell<bool>>,
    in_flight: Rc<Cell<Option<InFlight>>>,

    listeners: Rc<RefCell<SlotMap<ListenerKey, Listener<V>>>>,
}

impl<V> Query<V>
where
    V: QueryValue,
{
    pub(crate) fn new<Vars>(
        document: &TypedDocument<V, Vars>,
        transport: Rc<dyn Transport>,
        options: &QueryOptions<V>,
    ) -> Self {
        Query {
            template: Rc::new(document.request(None)),
            transport,
            keep_previous_data: options.keep_previous_data,
            error_policy: options.error_policy,
            state: Rc::new(Cell::new(QueryState::Created)),
            snapshot: Rc::new(RefCell::new(None)),
            issued: Rc::new(Cell::new(0)),
            applied: Rc::new(Cell::new(0)),
            settled: Rc::new(Cell::new(false)),
            in_flight: Rc::new(Cell::new(None)),
            listeners: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    fn name(&self) -> &str {
        self.template
            .operation_name
            .as_deref()
            .unwrap_or("anonymous query")
    }

    /**
     * State & Listeners.
     */

    pub(crate) fn get_state(&self) -> QueryState<V> {
        let state = self.state.take();
        let state_clone = state.clone();
        self.state.set(state);
        state_clone
    }

    // Useful to avoid clones.
    pub(crate) fn with_state<T>(&self, func: impl FnOnce(&QueryState<V>) -> T) -> T {
        let state = self.state.take();
        let result = func(&state);
        self.state.set(state);
        result
    }

    fn set_state(&self, state: QueryState<V>) {
        self.state.set(state.clone());

        let listeners = self.listeners.try_borrow().expect("set_state borrow");
        for listener in listeners.values() {
            listener(&state);
        }
    }

    fn update_state(&self, update_fn: impl FnOnce(QueryState<V>) -> QueryState<V>) {
        let state = self.state.take();
        self.set_state(update_fn(state));
    }

    /// Whether any request has committed a result, successful or not.
    pub(crate) fn has_settled(&self) -> bool {
        self.settled.get()
    }

    pub(crate) fn add_listener(&self, listener: impl Fn(&QueryState<V>) + 'static) -> ListenerKey {
        self.listeners
            .try_borrow_mut()
            .expect("add_listener borrow_mut")
            .insert(Box::new(listener))
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn remove_listener(&self, key: ListenerKey) -> bool {
        self.listeners
            .try_borrow_mut()
            .expect("remove_listener borrow_mut")
            .remove(key)
            .is_some()
    }

    /**
     * Execution and Cancellation.
     */

    /// Issues a request for `snapshot` on the local executor.
    pub(crate) fn execute(&self, snapshot: VariablesSnapshot) {
        leptos::spawn_local(self.fetch(snapshot));
    }

    /// Issues a request again for the last snapshot.
    pub(crate) fn refetch(&self) {
        let snapshot = self
            .snapshot
            .try_borrow()
            .expect("refetch borrow")
            .clone();
        match snapshot {
            Some(snapshot) => self.execute(snapshot),
            None => logging::debug_warn!("Refetch of {} before its first request.", self.name()),
        }
    }

    /// Starts a request and returns the future that completes it.
    /// The request supersedes anything still in flight.
    pub(crate) fn fetch(&self, snapshot: VariablesSnapshot) -> impl Future<Output = ()> + 'static {
        let request = snapshot.value().map(|variables| GraphQLRequest {
            variables,
            ..GraphQLRequest::clone(&self.template)
        });
        self.snapshot.replace(Some(snapshot));

        let (seq, cancellation) = self.begin();
        let query = self.clone();

        async move {
            let outcome = match request {
                Ok(request) => {
                    let started = Instant::now();
                    let transport = query.transport.clone();
                    let response = transport.execute(&request);
                    match execute_with_cancellation(response, cancellation).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            logging::debug_warn!(
                                "Request #{seq} for {} cancelled after {}ms.",
                                query.name(),
                                started.elapsed().as_millis()
                            );
                            return;
                        }
                    }
                }
                Err(error) => Err(error),
            };
            query.complete(seq, outcome);
        }
    }

    /// Registers a new request and moves to a pending state.
    pub(crate) fn begin(&self) -> (u64, oneshot::Receiver<()>) {
        let seq = self.issued.get() + 1;
        self.issued.set(seq);

        if let Some(superseded) = self.in_flight.take() {
            // The receiver is gone if that request already finished.
            let _ = superseded.cancel.send(());
        }

        let (sender, receiver) = oneshot::channel();
        self.in_flight.set(Some(InFlight {
            seq,
            cancel: sender,
        }));

        let keep_previous_data = self.keep_previous_data;
        self.update_state(|state| state.into_pending(keep_previous_data));

        (seq, receiver)
    }

    /// Applies the outcome of request `seq`.
    /// Returns false if a newer request has been issued or has already committed.
    pub(crate) fn complete(
        &self,
        seq: u64,
        outcome: Result<GraphQLResponse, QueryError>,
    ) -> bool {
        let latest = self.issued.get();
        if seq != latest || seq <= self.applied.get() {
            logging::debug_warn!(
                "Discarding response #{seq} for {}, latest request is #{latest}.",
                self.name()
            );
            return false;
        }
        self.applied.set(seq);
        self.settled.set(true);
        self.clear_in_flight(seq);

        let state = match outcome.and_then(|response| decode(response, self.error_policy)) {
            Ok(data) => QueryState::Loaded(QueryData::now(data)),
            Err(error) => {
                logging::debug_warn!("{} failed: {error}", self.name());
                QueryState::Failed(error)
            }
        };
        self.set_state(state);
        true
    }

    /// Abandons the in-flight request, restoring the last settled state.
    /// Returns whether there was a request to cancel.
    pub(crate) fn cancel(&self) -> bool {
        match self.in_flight.take() {
            Some(InFlight { seq, cancel }) => {
                // A late response for `seq` must not commit.
                self.applied.set(seq);
                if cancel.send(()).is_err() {
                    logging::debug_warn!("Request #{seq} for {} already finished.", self.name());
                }
                self.update_state(QueryState::into_settled);
                true
            }
            None => false,
        }
    }

    fn clear_in_flight(&self, seq: u64) {
        if let Some(in_flight) = self.in_flight.take() {
            if in_flight.seq != seq {
                self.in_flight.set(Some(in_flight));
            }
        }
    }
}

/// Turns a response envelope into the result type, honoring the error policy.
pub(crate) fn decode<V>(response: GraphQLResponse, policy: ErrorPolicy) -> Result<V, QueryError>
where
    V: QueryValue,
{
    let GraphQLResponse { data, errors } = response;
    let errors = errors.unwrap_or_default();
    let data = data.filter(|data| !data.is_null());

    match data {
        _ if !errors.is_empty() && policy == ErrorPolicy::Fail => Err(QueryError::GraphQL(errors)),
        None if !errors.is_empty() => Err(QueryError::GraphQL(errors)),
        None => Err(QueryError::MissingData),
        Some(data) => {
            if !errors.is_empty() {
                logging::debug_warn!(
                    "Ignoring {} GraphQL error(s): {}",
                    errors.len(),
                    QueryError::GraphQL(errors)
                );
            }
            serde_json::from_value(data).map_err(|e| QueryError::Decode(e.to_string()))
        }
    }
}

async fn execute_with_cancellation<V, Fu>(
    fut: Fu,
    cancellation: oneshot::Receiver<()>,
) -> Result<V, ()>
where
    Fu: Future<Output = V> + Unpin,
{
    use futures::future::Either;

    match futures::future::select(fut, cancellation).await {
        Either::Left((result, _)) => Ok(result),
        // Dropping the sender counts as cancellation too.
        Either::Right(_) => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockTransport;
    use futures::{executor::LocalPool, task::LocalSpawnExt};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct CountryQuery {
        country: Option<Country>,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Country {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, serde::Serialize)]
    struct CountryVariables {
        code: &'static str,
    }

    const COUNTRY_QUERY: TypedDocument<CountryQuery, CountryVariables> =
        TypedDocument::new("query CountryQuery($code: ID!) { country(code: $code) { name } }");

    fn country(name: &str) -> Result<GraphQLResponse, QueryError> {
        Ok(GraphQLResponse::data(json!({ "country": { "name": name } })))
    }

    fn name_of(state: &QueryState<CountryQuery>) -> Option<String> {
        state
            .data()
            .and_then(|d| d.country.as_ref())
            .map(|c| c.name.clone())
    }

    fn snapshot(code: &'static str) -> VariablesSnapshot {
        VariablesSnapshot::capture(&CountryVariables { code })
    }

    fn query_with(transport: &MockTransport, options: QueryOptions<CountryQuery>) -> Query<CountryQuery> {
        Query::new(&COUNTRY_QUERY, Rc::new(transport.clone()), &options)
    }

    #[test]
    fn newer_response_wins_when_it_arrives_first() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        spawner.spawn_local(query.fetch(snapshot("BR"))).expect("spawn");
        pool.run_until_stalled();
        spawner.spawn_local(query.fetch(snapshot("US"))).expect("spawn");
        pool.run_until_stalled();

        let requests = transport.requests();
        assert_eq!(2, requests.len());
        assert_eq!(Some(json!({ "code": "BR" })), requests[0].variables);
        assert_eq!(Some(json!({ "code": "US" })), requests[1].variables);

        transport.respond(1, country("United States"));
        pool.run_until_stalled();
        assert_eq!(Some("United States".to_string()), name_of(&query.get_state()));

        // The superseded request was cancelled; a late answer changes nothing.
        transport.respond(0, country("Brazil"));
        pool.run_until_stalled();
        assert_eq!(Some("United States".to_string()), name_of(&query.get_state()));
        assert!(matches!(query.get_state(), QueryState::Loaded(_)));
    }

    #[test]
    fn superseded_sequence_numbers_never_commit() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());

        let (first, _first_cancel) = query.begin();
        let (second, _second_cancel) = query.begin();
        assert!(!query.has_settled());

        // First response arrives before the second: still stale.
        assert!(!query.complete(first, country("Brazil")));
        assert!(query.with_state(|s| s.is_loading()));

        assert!(query.complete(second, country("United States")));
        assert!(!query.complete(second, country("Again")));
        assert!(query.has_settled());
        assert_eq!(Some("United States".to_string()), name_of(&query.get_state()));
    }

    #[test]
    fn refetch_keeps_previous_data_while_fetching() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());

        let (seq, _cancel) = query.begin();
        query.complete(seq, country("Brazil"));

        let (seq, _cancel) = query.begin();
        assert!(matches!(query.get_state(), QueryState::Fetching(_)));
        assert_eq!(Some("Brazil".to_string()), name_of(&query.get_state()));

        query.complete(seq, country("United States"));
        assert_eq!(Some("United States".to_string()), name_of(&query.get_state()));
    }

    #[test]
    fn without_previous_data_new_variables_load_from_scratch() {
        let transport = MockTransport::manual();
        let options = QueryOptions::default().set_keep_previous_data(false);
        let query = query_with(&transport, options);

        let (seq, _cancel) = query.begin();
        query.complete(seq, country("Brazil"));
        let (_seq, _cancel) = query.begin();

        assert!(matches!(query.get_state(), QueryState::Loading));
    }

    #[test]
    fn cancel_restores_settled_state() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());
        let mut pool = LocalPool::new();

        pool.spawner()
            .spawn_local(query.fetch(snapshot("BR")))
            .expect("spawn");
        pool.run_until_stalled();
        assert!(query.with_state(|s| s.is_loading()));

        assert!(query.cancel());
        assert!(!query.cancel());
        pool.run_until_stalled();
        assert!(matches!(query.get_state(), QueryState::Created));

        transport.respond(0, country("Brazil"));
        pool.run_until_stalled();
        assert!(matches!(query.get_state(), QueryState::Created));
    }

    #[test]
    fn listeners_see_every_transition() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let key = query.add_listener({
            let seen = seen.clone();
            move |state: &QueryState<CountryQuery>| {
                let label = match state {
                    QueryState::Created => "created",
                    QueryState::Loading => "loading",
                    QueryState::Fetching(_) => "fetching",
                    QueryState::Loaded(_) => "loaded",
                    QueryState::Failed(_) => "failed",
                };
                seen.borrow_mut().push(label);
            }
        });

        let (seq, _cancel) = query.begin();
        query.complete(seq, country("Brazil"));
        let (seq, _cancel) = query.begin();
        query.complete(seq, Err(QueryError::Transport("offline".into())));

        assert_eq!(
            vec!["loading", "loaded", "fetching", "failed"],
            *seen.borrow()
        );

        assert!(query.remove_listener(key));
        let (_seq, _cancel) = query.begin();
        assert_eq!(4, seen.borrow().len());
    }

    #[test]
    fn failures_leave_no_data() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());

        let (seq, _cancel) = query.begin();
        query.complete(seq, country("Brazil"));
        let (seq, _cancel) = query.begin();
        query.complete(
            seq,
            Err(QueryError::Status {
                status: 500,
                body: None,
            }),
        );

        let state = query.get_state();
        assert_eq!(None, name_of(&state));
        assert!(matches!(
            state.error(),
            Some(QueryError::Status { status: 500, .. })
        ));
    }

    #[test]
    fn unserializable_variables_fail_without_a_request() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());
        let mut pool = LocalPool::new();

        let mut bad_key = std::collections::HashMap::new();
        bad_key.insert((1, 2), "tuple keys are not JSON");
        let snapshot = VariablesSnapshot::capture(&bad_key);

        pool.spawner().spawn_local(query.fetch(snapshot)).expect("spawn");
        pool.run_until_stalled();

        assert!(transport.requests().is_empty());
        assert!(matches!(
            query.get_state().error(),
            Some(QueryError::Variables(_))
        ));
    }

    #[test]
    fn refetch_reuses_last_snapshot() {
        let transport = MockTransport::manual();
        let query = query_with(&transport, QueryOptions::default());
        let mut pool = LocalPool::new();

        pool.spawner()
            .spawn_local(query.fetch(snapshot("BR")))
            .expect("spawn");
        pool.run_until_stalled();
        transport.respond(0, country("Brazil"));
        pool.run_until_stalled();

        // Same snapshot, new sequence number.
        pool.spawner()
            .spawn_local(query.fetch(snapshot("BR")))
            .expect("spawn");
        pool.run_until_stalled();

        let requests = transport.requests();
        assert_eq!(2, requests.len());
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn decode_respects_error_policy() {
        let partial = GraphQLResponse {
            data: Some(json!({ "country": { "name": "Brazil" } })),
            errors: Some(vec![crate::GraphQLError::new("deprecated field")]),
        };

        let failed = decode::<CountryQuery>(partial.clone(), ErrorPolicy::Fail);
        assert!(matches!(failed, Err(QueryError::GraphQL(ref e)) if e.len() == 1));

        let ignored = decode::<CountryQuery>(partial, ErrorPolicy::Ignore).expect("data");
        assert_eq!(Some("Brazil".to_string()), ignored.country.map(|c| c.name));

        let only_errors = GraphQLResponse::errors(vec![crate::GraphQLError::new("boom")]);
        assert!(matches!(
            decode::<CountryQuery>(only_errors, ErrorPolicy::Ignore),
            Err(QueryError::GraphQL(_))
        ));

        let empty = GraphQLResponse::default();
        assert_eq!(
            Err(QueryError::MissingData),
            decode::<CountryQuery>(empty, ErrorPolicy::Fail)
        );

        let wrong_shape = GraphQLResponse::data(json!({ "country": { "name": 7 } }));
        assert!(matches!(
            decode::<CountryQuery>(wrong_shape, ErrorPolicy::Fail),
            Err(QueryError::Decode(_))
        ));
    }
}
