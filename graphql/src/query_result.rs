use crate::{QueryError, QueryState};
use leptos::*;

/// Reactive query result.
#[derive(Clone)]
pub struct QueryResult<V, R>
where
    V: 'static,
    R: RefetchFn,
{
    /// The value to show for the query.
    ///
    /// The default value (or [`None`]) until the first result arrives, then the latest
    /// result. [`None`] after a failure.
    pub data: Signal<Option<V>>,
    /// The current state of the query.
    pub state: Signal<QueryState<V>>,
    /// The error of the latest request, if it failed.
    pub error: Signal<Option<QueryError>>,
    /// Whether the first request for the current data is in flight.
    pub is_loading: Signal<bool>,
    /// Whether any request is in flight.
    pub is_fetching: Signal<bool>,

    /// Refetch the query with its current variables.
    pub refetch: R,
}

/// Convenience Trait alias for a Query Result's refetch function.
pub trait RefetchFn: Fn() + Clone {}
impl<R: Fn() + Clone> RefetchFn for R {}
