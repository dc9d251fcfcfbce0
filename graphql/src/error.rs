use crate::GraphQLError;

/// Errors raised while building a [`GraphQLClient`](crate::GraphQLClient).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The endpoint is empty or not an absolute URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The endpoint as given.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Why a query failed.
///
/// Errors are stored inside reactive state, so they are cheap to clone and comparable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The request never produced a response (network unreachable, aborted, CORS...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, if it could be read.
        body: Option<String>,
    },
    /// The response carried a GraphQL `errors` array.
    #[error("{}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),
    /// The response had neither `data` nor `errors`.
    #[error("response contained no data")]
    MissingData,
    /// `data` could not be decoded into the expected result type.
    #[error("failed to decode response: {0}")]
    Decode(String),
    /// The variables could not be serialized.
    #[error("failed to serialize variables: {0}")]
    Variables(String),
}

impl QueryError {
    /// The GraphQL errors, if this failure came from the `errors` array.
    pub fn graphql_errors(&self) -> Option<&[GraphQLError]> {
        match self {
            QueryError::GraphQL(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            QueryError::Decode(error.to_string())
        } else {
            QueryError::Transport(error.to_string())
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    match errors {
        [] => "graphql error".to_string(),
        [single] => single.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
