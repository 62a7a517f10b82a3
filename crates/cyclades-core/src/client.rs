//! HTTP dispatch for the Cyclades API.
//!
//! [`ServiceClient`] turns a verb, a relative path and an optional JSON body into exactly one
//! authenticated request and normalizes the outcome into a [`Result`] of the parsed body.

use crate::{Error, Result};
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Header carrying the API token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

const USER_AGENT: &str = concat!("cyclades-core/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
///
/// Timeouts are unset by default, leaving the transport's own defaults in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Total request timeout
    pub timeout: Option<Duration>,

    /// Connection establishment timeout
    pub connect_timeout: Option<Duration>,

    /// Enable response compression
    pub enable_compression: bool,
}

impl HttpConfig {
    /// Create a new HTTP configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`ServiceClient`].
#[derive(Clone)]
pub struct ServiceClientBuilder {
    endpoint: String,
    token: String,
    http_config: HttpConfig,
    user_agent: String,
}

impl fmt::Debug for ServiceClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("http_config", &self.http_config)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl ServiceClientBuilder {
    /// Create a builder. Endpoint and token are kept exactly as given.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            http_config: HttpConfig::new(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be sent as a header value or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<ServiceClient> {
        let mut token = HeaderValue::from_str(&self.token).map_err(|err| {
            Error::Config(format!("Token is not a valid {AUTH_TOKEN_HEADER} value: {err}"))
        })?;
        token.set_sensitive(true);

        // Certificate validation is never relaxed.
        let mut builder = ClientBuilder::new().user_agent(self.user_agent);

        if let Some(timeout) = self.http_config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.http_config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if !self.http_config.enable_compression {
            builder = builder.no_gzip();
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(ServiceClient {
            http,
            inner: Arc::new(Credentials {
                endpoint: self.endpoint,
                token,
            }),
        })
    }
}

struct Credentials {
    endpoint: String,
    token: HeaderValue,
}

/// Authenticated dispatcher for the Cyclades API.
///
/// Cloning is cheap; clones share the same immutable endpoint and token.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    inner: Arc<Credentials>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Construct a client with default HTTP settings.
    ///
    /// # Errors
    ///
    /// See [`ServiceClientBuilder::build`].
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        ServiceClientBuilder::new(endpoint, token).build()
    }

    /// Return the endpoint exactly as configured.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Send one request to `<endpoint>/<path>` and return the parsed response body.
    ///
    /// An empty (or JSON `null`) body is replaced by `{"statusCode", "statusMessage"}`, and a
    /// body that is not JSON is returned as a JSON string.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidEndpoint`] when endpoint and path do not form a URL.
    /// * [`Error::Transport`] when no response was received.
    /// * [`Error::Status`] when the response status is 400 or above.
    pub async fn call<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path)?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTH_TOKEN_HEADER, self.inner.token.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(payload) = body {
            request = request.json(payload);
        }

        debug!(method = %method, path, "Cyclades request");

        let response = request.send().await?;
        let status = response.status();
        let message = status_message(status, response.extensions().get::<ReasonPhrase>());
        let bytes = response.bytes().await?;

        debug!(method = %method, path, status = status.as_u16(), "Cyclades response");

        let body = parse_body(status, &message, &bytes);
        if status.as_u16() >= 400 {
            return Err(Error::Status {
                status_code: status.as_u16(),
                status_message: message,
                body,
            });
        }

        Ok(body)
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.inner.endpoint, path);
        Url::parse(&raw).map_err(|err| Error::InvalidEndpoint(format!("`{raw}`: {err}")))
    }
}

/// The server's reason phrase when it sent a non-standard one, else the canonical phrase.
fn status_message(status: StatusCode, phrase: Option<&ReasonPhrase>) -> String {
    phrase
        .and_then(|phrase| std::str::from_utf8(phrase.as_bytes()).ok())
        .or_else(|| status.canonical_reason())
        .unwrap_or_default()
        .to_string()
}

fn fallback_body(status: StatusCode, message: &str) -> Value {
    json!({
        "statusCode": status.as_u16(),
        "statusMessage": message,
    })
}

fn parse_body(status: StatusCode, message: &str, bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return fallback_body(status, message);
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Null) => fallback_body(status, message),
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
