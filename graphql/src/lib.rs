#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # About GraphQL
//!
//! Leptos GraphQL is a reactive GraphQL client for [Leptos](https://github.com/leptos-rs/leptos).
//!
//! A client is bound to one endpoint. Running a query returns signals that follow the
//! query through its lifecycle:
//! - empty (or a default value) while the first request is in flight
//! - the decoded result once it arrives
//! - a failed state carrying the error otherwise
//!
//! When the query's variables come from signals, the query is re-issued whenever they
//! change. Only the response to the newest variables is ever applied, whatever order the
//! responses arrive in; superseded requests are cancelled.
//!
//! ## The main entry points are:
//! - [`create_graphql_client`] - Creates a [`GraphQLClient`] for an endpoint.
//! - [`GraphQLClient::use_query_with_variables`] - Runs a query and tracks its variables.
//! - [`TypedDocument`] - A document that carries its result and variables types.
//!
//! # Feature Flags
//! - `csr` Client-side rendering: Use queries on the client.
//! - `hydrate` Hydration: Use queries on the client after server-side rendering.
//!
//! # A Simple Example
//!
//! In the root of your App, create a client and provide it with [provide_graphql_client].
//!
//! ```rust
//! use leptos::*;
//! use leptos_graphql::*;
//!
//! #[component]
//! pub fn App() -> impl IntoView {
//!     match create_graphql_client("https://countries.trevorblades.com/", ClientOptions::default()) {
//!         Ok(client) => provide_graphql_client(client),
//!         Err(error) => logging::error!("{error}"),
//!     }
//!
//!     // Rest of App...
//! }
//! ```
//!
//! Then describe a query. Code generators usually emit these.
//!
//! ```
//! use leptos_graphql::*;
//!
//! #[derive(Debug, Clone, serde::Deserialize)]
//! pub struct CountryQuery {
//!     pub country: Option<Country>,
//! }
//!
//! #[derive(Debug, Clone, serde::Deserialize)]
//! pub struct Country {
//!     pub name: String,
//! }
//!
//! #[derive(Debug, Clone, serde::Serialize)]
//! pub struct CountryQueryVariables {
//!     pub code: String,
//! }
//!
//! pub const COUNTRY_QUERY_DOCUMENT: TypedDocument<CountryQuery, CountryQueryVariables> =
//!     TypedDocument::new("query CountryQuery($code: ID!) { country(code: $code) { name } }");
//! ```
//!
//! Now use it in any component.
//!
//! ```rust
//! # use leptos_graphql::*;
//! # #[derive(Debug, Clone, serde::Deserialize)]
//! # pub struct CountryQuery {
//! #     pub country: Option<Country>,
//! # }
//! # #[derive(Debug, Clone, serde::Deserialize)]
//! # pub struct Country {
//! #     pub name: String,
//! # }
//! # #[derive(Debug, Clone, serde::Serialize)]
//! # pub struct CountryQueryVariables {
//! #     pub code: String,
//! # }
//! # pub const COUNTRY_QUERY_DOCUMENT: TypedDocument<CountryQuery, CountryQueryVariables> =
//! #     TypedDocument::new("query CountryQuery($code: ID!) { country(code: $code) { name } }");
//! use leptos::*;
//!
//! #[component]
//! fn CountryName(code: ReadSignal<String>) -> impl IntoView {
//!     let QueryResult { data, error, .. } = use_graphql_client().use_query_with_options(
//!         COUNTRY_QUERY_DOCUMENT,
//!         move || CountryQueryVariables { code: code.get() },
//!         QueryOptions::default().set_default_value(Some(CountryQuery {
//!             country: Some(Country { name: "loading...".into() }),
//!         })),
//!     );
//!
//!     view! {
//!         <h4>
//!             {move || match (data.get().and_then(|d| d.country), error.get()) {
//!                 (Some(country), _) => country.name,
//!                 (None, Some(error)) => error.to_string(),
//!                 (None, None) => "not found".to_string(),
//!             }}
//!         </h4>
//!     }
//! }
//! ```
//!

mod client;
mod document;
mod error;
mod instant;
mod query;
mod query_options;
mod query_result;
mod query_state;
mod transport;
mod use_query;
mod wire;

#[cfg(test)]
mod test_util;

pub use client::*;
pub use document::{gql, Gql, IntoDocument, TypedDocument, VariablesSnapshot};
pub use error::*;
pub use instant::*;
pub use query_options::*;
pub use query_result::*;
pub use query_state::*;
pub use transport::*;
pub use wire::*;

/// Convenience trait for query result requirements.
pub trait QueryValue: std::fmt::Debug + Clone + serde::de::DeserializeOwned + 'static {}
impl<V> QueryValue for V where V: std::fmt::Debug + Clone + serde::de::DeserializeOwned + 'static {}

/// Convenience trait for query variables requirements.
pub trait QueryVariables: serde::Serialize + 'static {}
impl<V> QueryVariables for V where V: serde::Serialize + 'static {}
