/// What to do with a response that carries both `data` and `errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Any GraphQL error fails the query.
    #[default]
    Fail,
    /// Use `data` when present and only log the errors.
    /// A response without `data` still fails.
    Ignore,
}

/**
 * Options for a query [`use_query_with_options()`](crate::GraphQLClient::use_query_with_options)
 */
#[derive(Debug, Clone)]
pub struct QueryOptions<V> {
    /// Placeholder value to show until the first result arrives.
    pub default_value: Option<V>,
    /// When the variables change, keep showing the previous data (in
    /// [`QueryState::Fetching`](crate::QueryState::Fetching)) until the new result arrives.
    /// If false, the query goes back to [`QueryState::Loading`](crate::QueryState::Loading).
    /// Default is true.
    pub keep_previous_data: bool,
    /// How GraphQL errors in a response are treated.
    pub error_policy: ErrorPolicy,
}

impl<V> Default for QueryOptions<V> {
    fn default() -> Self {
        Self {
            default_value: None,
            keep_previous_data: true,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl<V> QueryOptions<V> {
    /// Set the default value.
    pub fn set_default_value(self, default_value: Option<V>) -> Self {
        QueryOptions {
            default_value,
            ..self
        }
    }

    /// Set whether previous data is kept while refetching.
    pub fn set_keep_previous_data(self, keep_previous_data: bool) -> Self {
        QueryOptions {
            keep_previous_data,
            ..self
        }
    }

    /// Set the error policy.
    pub fn set_error_policy(self, error_policy: ErrorPolicy) -> Self {
        QueryOptions {
            error_policy,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = QueryOptions::<u32>::default();
        assert_eq!(None, options.default_value);
        assert!(options.keep_previous_data);
        assert_eq!(ErrorPolicy::Fail, options.error_policy);
    }

    #[test]
    fn builder() {
        let options = QueryOptions::default()
            .set_default_value(Some(2_u32))
            .set_keep_previous_data(false)
            .set_error_policy(ErrorPolicy::Ignore);

        assert_eq!(Some(2), options.default_value);
        assert!(!options.keep_previous_data);
        assert_eq!(ErrorPolicy::Ignore, options.error_policy);
    }
}
