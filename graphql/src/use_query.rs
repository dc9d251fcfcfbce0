use leptos::*;

use crate::query::Query;
use crate::{QueryResult, QueryValue, QueryVariables, RefetchFn, VariablesSnapshot};

/// Binds a [`Query`] to the reactive graph.
///
/// The variables producer is memoized by its serialized value, so the request is
/// re-issued only when the variables actually change. The query is cancelled when
/// the owning scope is disposed.
pub(crate) fn use_query<V, Vars>(
    query: Query<V>,
    variables: impl Fn() -> Vars + 'static,
    default_value: Option<V>,
) -> QueryResult<V, impl RefetchFn>
where
    V: QueryValue,
    Vars: QueryVariables,
{
    let state = RwSignal::new(query.get_state());
    let listener = query.add_listener(move |next| state.set(next.clone()));

    let snapshot = create_memo(move |_| VariablesSnapshot::capture(&variables()));

    create_isomorphic_effect({
        let query = query.clone();
        move |_| {
            let snapshot = snapshot.get();
            query.execute(snapshot);
        }
    });

    on_cleanup({
        let query = query.clone();
        move || {
            if !query.remove_listener(listener) {
                logging::debug_warn!("Failed to remove listener.");
            }
            query.cancel();
        }
    });

    let data = {
        let query = query.clone();
        Signal::derive(move || {
            // The placeholder is only for the time before the first result.
            let fallback = default_value.as_ref().filter(|_| !query.has_settled());
            state.with(|s| s.data_or(fallback))
        })
    };

    QueryResult {
        data,
        state: state.into(),
        error: Signal::derive(move || state.with(|s| s.error().cloned())),
        is_loading: Signal::derive(move || state.with(|s| s.is_loading())),
        is_fetching: Signal::derive(move || state.with(|s| s.is_fetching())),
        refetch: move || query.refetch(),
    }
}
