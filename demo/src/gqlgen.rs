//! Types and documents as emitted by a GraphQL code generator.

use leptos_graphql::TypedDocument;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryQueryVariables {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryQuery {
    pub country: Option<CountryQueryCountry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryQueryCountry {
    pub name: String,
}

pub const COUNTRY_QUERY_DOCUMENT: TypedDocument<CountryQuery, CountryQueryVariables> =
    TypedDocument::new(
        r#"query CountryQuery($code: ID!) {
  country(code: $code) {
    name
  }
}"#,
    );
