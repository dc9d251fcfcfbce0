use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL-over-HTTP request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    /// Document text.
    pub query: String,
    /// Serialized variables. Omitted when there are none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    /// Operation to run when the document defines several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

/// A GraphQL response envelope, before `data` is decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// Result of the operation. May be partial when `errors` is present.
    #[serde(default)]
    pub data: Option<Value>,
    /// Errors raised while executing the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,
}

impl GraphQLResponse {
    /// A successful response carrying `data`.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// A response carrying only errors.
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self {
            data: None,
            errors: Some(errors),
        }
    }

    /// Whether the response carries at least one error.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// An entry of the response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Human readable description.
    pub message: String,
    /// Where in the document the error occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<GraphQLLocation>>,
    /// Path to the response field that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    /// Server specific details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// An error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
            extensions: None,
        }
    }
}

/// Line and column in the document, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    #[allow(missing_docs)]
    pub line: u32,
    #[allow(missing_docs)]
    pub column: u32,
}

/// Field name or list index in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A response key.
    Field(String),
    /// A list position.
    Index(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_omits_absent_fields() {
        let request = GraphQLRequest {
            query: "{ countries { code } }".to_string(),
            variables: None,
            operation_name: None,
        };

        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json!({ "query": "{ countries { code } }" }), body);
    }

    #[test]
    fn request_uses_camel_case_operation_name() {
        let request = GraphQLRequest {
            query: "query CountryQuery($code: ID!) { country(code: $code) { name } }".into(),
            variables: Some(json!({ "code": "BR" })),
            operation_name: Some("CountryQuery".into()),
        };

        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(Some(&json!("CountryQuery")), body.get("operationName"));
        assert_eq!(Some(&json!({ "code": "BR" })), body.get("variables"));
    }

    #[test]
    fn response_with_errors_and_path() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{
                "message": "Country not found",
                "locations": [{ "line": 1, "column": 3 }],
                "path": ["country", 0]
            }]
        }))
        .expect("deserialize");

        assert!(response.has_errors());
        assert_eq!(None, response.data);

        let error = &response.errors.as_ref().expect("errors")[0];
        assert_eq!("Country not found", error.message);
        assert_eq!(
            Some(vec![
                PathSegment::Field("country".into()),
                PathSegment::Index(0)
            ]),
            error.path
        );
    }

    #[test]
    fn response_without_errors_field() {
        let response: GraphQLResponse =
            serde_json::from_value(json!({ "data": { "country": null } })).expect("deserialize");
        assert!(!response.has_errors());
        assert_eq!(Some(json!({ "country": null })), response.data);
    }
}
