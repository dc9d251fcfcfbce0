use crate::{Instant, QueryError};

/// The lifecycle of a GraphQL query.
///
/// Each variant corresponds to one step of a query accessor's life, from creation
/// through every fetch it performs.
#[derive(Clone, PartialEq, Default)]
pub enum QueryState<V> {
    /// No request has been issued yet.
    #[default]
    Created,

    /// A request is in flight and there is no data to show.
    Loading,

    /// A request is in flight. The associated `QueryData<V>` is the previous result,
    /// which may belong to older variables.
    Fetching(QueryData<V>),

    /// The latest request succeeded.
    Loaded(QueryData<V>),

    /// The latest request failed.
    ///
    /// Data from earlier requests is dropped so it cannot be mistaken for the
    /// answer to the current variables.
    Failed(QueryError),
}

impl<V> QueryState<V> {
    /// Returns the QueryData for the current QueryState, if present.
    pub fn query_data(&self) -> Option<&QueryData<V>> {
        match self {
            QueryState::Created | QueryState::Loading | QueryState::Failed(_) => None,
            QueryState::Fetching(data) | QueryState::Loaded(data) => Some(data),
        }
    }

    /// Returns the data contained within the QueryState, if present.
    pub fn data(&self) -> Option<&V> {
        self.query_data().map(|s| &s.data)
    }

    /// Returns the error of a failed query.
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the last updated timestamp for the QueryState, if present.
    pub fn updated_at(&self) -> Option<Instant> {
        self.query_data().map(|s| s.updated_at)
    }

    /// True while the first request for the current data is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    /// True while any request is in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(self, QueryState::Loading | QueryState::Fetching(_))
    }

    /// True once a request has settled, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryState::Loaded(_) | QueryState::Failed(_))
    }

    /// The state to enter when a new request starts.
    pub(crate) fn into_pending(self, keep_previous_data: bool) -> QueryState<V> {
        match self {
            QueryState::Fetching(data) | QueryState::Loaded(data) if keep_previous_data => {
                QueryState::Fetching(data)
            }
            _ => QueryState::Loading,
        }
    }

    /// The state to return to when the in-flight request is abandoned.
    pub(crate) fn into_settled(self) -> QueryState<V> {
        match self {
            QueryState::Fetching(data) => QueryState::Loaded(data),
            QueryState::Loading => QueryState::Created,
            state => state,
        }
    }

    /// Value an accessor shows for this state.
    /// `fallback` stands in while there is no data; the caller passes `None`
    /// once a first result has arrived.
    pub(crate) fn data_or(&self, fallback: Option<&V>) -> Option<V>
    where
        V: Clone,
    {
        match self {
            QueryState::Created | QueryState::Loading => fallback.cloned(),
            QueryState::Fetching(data) | QueryState::Loaded(data) => Some(data.data.clone()),
            QueryState::Failed(_) => None,
        }
    }
}

impl<V> std::fmt::Debug for QueryState<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Loading => write!(f, "Loading"),
            Self::Fetching(arg0) => f.debug_tuple("Fetching").field(arg0).finish(),
            Self::Loaded(arg0) => f.debug_tuple("Loaded").field(arg0).finish(),
            Self::Failed(arg0) => f.debug_tuple("Failed").field(arg0).finish(),
        }
    }
}

/// The latest data for a Query.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryData<V> {
    /// The Data.
    pub data: V,
    /// The instant this data was retrieved.
    pub updated_at: Instant,
}

impl<V> QueryData<V> {
    /// Creates a new QueryData with the given data and the current time as the updated_at timestamp.
    pub fn now(data: V) -> Self {
        Self {
            data,
            updated_at: Instant::now(),
        }
    }
}

impl<V> std::fmt::Debug for QueryData<V>
where
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryData")
            .field("data", &self.data)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(value: &str) -> QueryState<String> {
        QueryState::Loaded(QueryData::now(value.to_string()))
    }

    #[test]
    fn fallback_only_before_first_result() {
        let fallback = "loading...".to_string();

        assert_eq!(
            Some(fallback.clone()),
            QueryState::<String>::Created.data_or(Some(&fallback))
        );
        assert_eq!(
            Some(fallback.clone()),
            QueryState::<String>::Loading.data_or(Some(&fallback))
        );
        assert_eq!(None, QueryState::<String>::Loading.data_or(None));
        assert_eq!(Some("Brazil".to_string()), loaded("Brazil").data_or(Some(&fallback)));
        assert_eq!(
            None,
            QueryState::<String>::Failed(QueryError::MissingData).data_or(Some(&fallback))
        );
    }

    #[test]
    fn pending_keeps_previous_data_when_asked() {
        let pending = loaded("Brazil").into_pending(true);
        assert!(matches!(pending, QueryState::Fetching(ref d) if d.data == "Brazil"));
        assert!(pending.is_fetching());
        assert!(!pending.is_loading());

        assert!(matches!(loaded("Brazil").into_pending(false), QueryState::Loading));
        assert!(matches!(
            QueryState::<String>::Failed(QueryError::MissingData).into_pending(true),
            QueryState::Loading
        ));
    }

    #[test]
    fn settling_an_abandoned_request() {
        assert!(matches!(
            QueryState::<String>::Loading.into_settled(),
            QueryState::Created
        ));
        assert!(matches!(
            loaded("Brazil").into_pending(true).into_settled(),
            QueryState::Loaded(ref d) if d.data == "Brazil"
        ));
    }

    #[test]
    fn failed_state_exposes_error() {
        let state = QueryState::<String>::Failed(QueryError::MissingData);
        assert_eq!(Some(&QueryError::MissingData), state.error());
        assert!(state.is_settled());
        assert_eq!(None, state.data());
        assert_eq!(None, state.updated_at());
    }
}
