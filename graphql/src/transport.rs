use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Url;

use crate::{ClientError, GraphQLRequest, GraphQLResponse, QueryError};

/// Sends GraphQL requests to an endpoint.
///
/// Futures are not required to be `Send` since queries run on the local task set.
/// Dropping the returned future must abandon the request.
#[async_trait(?Send)]
pub trait Transport {
    /// Executes one request.
    async fn execute(&self, request: &GraphQLRequest) -> Result<GraphQLResponse, QueryError>;
}

/// How the browser treats cookies and HTTP authentication for requests.
///
/// Only applies to `wasm32` builds; native requests never send ambient credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Credentials {
    /// Never send credentials.
    Omit,
    /// Send credentials to same-origin endpoints.
    #[default]
    SameOrigin,
    /// Always send credentials, including cross-origin.
    Include,
}

/// Transport configuration for a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Credentials mode for browser fetches.
    pub credentials: Credentials,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl ClientOptions {
    /// Set the credentials mode.
    pub fn set_credentials(self, credentials: Credentials) -> Self {
        ClientOptions {
            credentials,
            ..self
        }
    }

    /// Add a header sent with every request.
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub(crate) fn header_map(&self) -> Result<HeaderMap, ClientError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let invalid = |reason: String| ClientError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            map.append(header_name, header_value);
        }
        Ok(map)
    }
}

const GRAPHQL_ACCEPT: &str = "application/graphql-response+json, application/json";

/// [`Transport`] that POSTs JSON over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
    credentials: Credentials,
}

impl HttpTransport {
    /// Validates the endpoint and headers. Does not touch the network.
    pub fn new(endpoint: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let invalid = |reason: &str| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };
        if endpoint.trim().is_empty() {
            return Err(invalid("endpoint is empty"));
        }
        let endpoint_url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }

        let mut headers = options.header_map()?;
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static(GRAPHQL_ACCEPT));

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: endpoint_url,
            headers,
            credentials: options.credentials,
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn apply_credentials(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                match self.credentials {
                    Credentials::Omit => builder.fetch_credentials_omit(),
                    Credentials::SameOrigin => builder.fetch_credentials_same_origin(),
                    Credentials::Include => builder.fetch_credentials_include(),
                }
            } else {
                let _ = self.credentials;
                builder
            }
        }
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn execute(&self, request: &GraphQLRequest) -> Result<GraphQLResponse, QueryError> {
        let builder = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .json(request);

        let response = self.apply_credentials(builder).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            return Err(QueryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<GraphQLResponse>().await?)
    }
}
