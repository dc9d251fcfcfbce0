use std::rc::Rc;

use leptos::*;

use crate::query::{decode, Query};
use crate::{
    use_query::use_query, ClientError, ClientOptions, ErrorPolicy, HttpTransport, IntoDocument,
    QueryError, QueryOptions, QueryResult, QueryValue, QueryVariables, RefetchFn, Transport,
    VariablesSnapshot,
};

/// Creates a client bound to `endpoint`.
///
/// Only validates the configuration; no request is made until a query is used.
///
/// ```
/// use leptos_graphql::*;
///
/// let client = create_graphql_client(
///     "https://countries.trevorblades.com/",
///     ClientOptions::default().set_credentials(Credentials::SameOrigin),
/// );
/// assert!(client.is_ok());
/// ```
pub fn create_graphql_client(
    endpoint: &str,
    options: ClientOptions,
) -> Result<GraphQLClient, ClientError> {
    let transport = HttpTransport::new(endpoint, options)?;
    Ok(GraphQLClient::with_transport(transport))
}

/// Provides a GraphQL Client to the current scope.
pub fn provide_graphql_client(client: GraphQLClient) {
    provide_context(client);
}

/// Retrieves a GraphQL Client from the current scope.
///
/// # Panics
/// If no client was provided with [`provide_graphql_client`].
pub fn use_graphql_client() -> GraphQLClient {
    use_context::<GraphQLClient>().expect("GraphQL Client Missing.")
}

/// A GraphQL client bound to one endpoint.
///
/// Queries are issued through:
/// - [`use_query`](Self::use_query) - a query without variables.
/// - [`use_query_with_variables`](Self::use_query_with_variables) - variables come from a reactive closure.
///     - The query is re-issued whenever the variables change.
/// - [`use_query_with_options`](Self::use_query_with_options) - also takes a default value and error policy.
/// - [`fetch_query`](Self::fetch_query) - a single request outside the reactive graph.
///
/// Documents can be a [`TypedDocument`](crate::TypedDocument), which infers the result and variables
/// types, or a plain string / [`gql`](crate::gql()), which needs them named explicitly.
#[derive(Clone)]
pub struct GraphQLClient {
    transport: Rc<dyn Transport>,
}

impl GraphQLClient {
    /// Creates a client over a custom transport.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Rc::new(transport),
        }
    }

    /// Runs a query without variables.
    ///
    /// ```
    /// use leptos::*;
    /// use leptos_graphql::*;
    ///
    /// #[derive(Debug, Clone, serde::Deserialize)]
    /// struct Countries {
    ///     countries: Vec<Country>,
    /// }
    ///
    /// #[derive(Debug, Clone, serde::Deserialize)]
    /// struct Country {
    ///     name: String,
    ///     code: String,
    /// }
    ///
    /// #[component]
    /// fn CountryList() -> impl IntoView {
    ///     let QueryResult { data, .. } = use_graphql_client()
    ///         .use_query::<Countries>("query CountriesQuery { countries { name code } }");
    ///
    ///     view! {
    ///         <ul>
    ///             {move || {
    ///                 data.get()
    ///                     .map(|data| {
    ///                         data.countries
    ///                             .into_iter()
    ///                             .map(|c| view! { <li>{c.code} " - " {c.name}</li> })
    ///                             .collect_view()
    ///                     })
    ///             }}
    ///         </ul>
    ///     }
    /// }
    /// ```
    pub fn use_query<V>(&self, document: impl IntoDocument<V, ()>) -> QueryResult<V, impl RefetchFn>
    where
        V: QueryValue,
    {
        self.use_query_with_options(document, || (), QueryOptions::default())
    }

    /// Runs a query whose variables are read from `variables`.
    ///
    /// `variables` is tracked: when the signals it reads change and it produces different
    /// variables, a new request is issued. Responses to older variables are discarded.
    pub fn use_query_with_variables<V, Vars>(
        &self,
        document: impl IntoDocument<V, Vars>,
        variables: impl Fn() -> Vars + 'static,
    ) -> QueryResult<V, impl RefetchFn>
    where
        V: QueryValue,
        Vars: QueryVariables,
    {
        self.use_query_with_options(document, variables, QueryOptions::default())
    }

    /// Same as [`use_query_with_variables`](Self::use_query_with_variables), with options.
    pub fn use_query_with_options<V, Vars>(
        &self,
        document: impl IntoDocument<V, Vars>,
        variables: impl Fn() -> Vars + 'static,
        options: QueryOptions<V>,
    ) -> QueryResult<V, impl RefetchFn>
    where
        V: QueryValue,
        Vars: QueryVariables,
    {
        let query = Query::new(&document.into_document(), self.transport.clone(), &options);
        use_query(query, variables, options.default_value)
    }

    /// Sends a single request and decodes the result.
    ///
    /// Nothing is cached and no signal is created. Any GraphQL error fails the request.
    pub async fn fetch_query<V, Vars>(
        &self,
        document: impl IntoDocument<V, Vars>,
        variables: &Vars,
    ) -> Result<V, QueryError>
    where
        V: QueryValue,
        Vars: QueryVariables,
    {
        let document = document.into_document();
        let variables = VariablesSnapshot::capture(variables).value()?;
        let response = self.transport.execute(&document.request(variables)).await?;
        decode(response, ErrorPolicy::Fail)
    }
}
