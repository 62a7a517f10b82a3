//! Error types for Cyclades operations.
//!
//! Transport failures are carried through untouched; HTTP statuses of 400 and above are
//! turned into [`Error::Status`] together with the response body the provider returned.

use serde_json::Value;
use thiserror::Error;

/// Main error type for Cyclades operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The HTTP transport failed before a response was received
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a status code of 400 or above
    #[error("Cyclades API returned {status_code} {status_message}")]
    Status {
        /// Numeric HTTP status code
        status_code: u16,
        /// Reason phrase for the status code
        status_message: String,
        /// Parsed response body, or a `statusCode`/`statusMessage` object when empty
        body: Value,
    },

    /// Endpoint and path do not form a valid URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A response body did not match the requested model
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Specialized result type for Cyclades operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Status { .. } => "HTTP_STATUS",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
        }
    }

    /// Returns the HTTP status code when the error came from an API response.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns the response body delivered alongside a status error.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for a 404 from the API.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status_code(), Some(404))
    }

    /// True when the transport gave up waiting for the API.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_timeout())
    }

    /// True when no connection to the API could be established.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_connect())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}
