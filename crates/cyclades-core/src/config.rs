//! Configuration structures for Cyclades clients.
//!
//! [`CycladesConfig`] is the loadable form of a client's settings: it can be deserialized
//! from any serde format or read from the environment, and is validated before a client
//! is built from it.

use crate::client::HttpConfig;
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use validator::Validate;

/// Environment variable holding the API endpoint.
pub const ENV_ENDPOINT: &str = "CYCLADES_ENDPOINT";
/// Environment variable holding the API token.
pub const ENV_TOKEN: &str = "CYCLADES_TOKEN";
/// Environment variable holding an optional request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CYCLADES_TIMEOUT_SECS";

/// Configuration for a Cyclades client instance.
#[derive(Debug, Deserialize, Validate)]
pub struct CycladesConfig {
    /// Compute API base URL (e.g. "https://cyclades.example.org/compute/v2.0")
    #[validate(url)]
    pub endpoint: String,

    /// API token sent as `X-Auth-Token`
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: SecretString,

    /// Request timeout in seconds; the transport default applies when unset
    #[validate(range(min = 1, max = 600))]
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Connect timeout in seconds; the transport default applies when unset
    #[validate(range(min = 1, max = 120))]
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl CycladesConfig {
    /// Create a new configuration from an endpoint and token.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid URL.
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            token: SecretString::from(token.into()),
            request_timeout_secs: None,
            connect_timeout_secs: None,
        };

        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Load the configuration from `CYCLADES_ENDPOINT`, `CYCLADES_TOKEN` and the optional
    /// `CYCLADES_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .ok_or_else(|| Error::Config(format!("{ENV_ENDPOINT} is not set")))?;
        let token =
            lookup(ENV_TOKEN).ok_or_else(|| Error::Config(format!("{ENV_TOKEN} is not set")))?;

        let mut config = Self::new(endpoint, token)?;

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let seconds = raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds: {e}"))
            })?;
            config = config.with_timeout(seconds);
            config.validate()?;
        }

        Ok(config)
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = Some(seconds);
        self
    }

    /// Set connect timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = Some(seconds);
        self
    }

    /// Get the request timeout as a Duration, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Get the connect timeout as a Duration, if set.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// HTTP transport settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig::new();
        if let Some(timeout) = self.timeout() {
            http = http.with_timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout() {
            http = http.with_connect_timeout(timeout);
        }
        http
    }
}
