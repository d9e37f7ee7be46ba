use serde::{Deserialize, Serialize};

/// All possible transport library errors.
///
/// Translation errors (`Validation`, `Attachment`) are raised before any
/// request is made. `Transport` errors come from the client collaborator and
/// are passed through as-is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to load attachment from {origin}: {reason}")]
    Attachment { origin: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the HTTP client collaborator.
/// Each variant can store a message for logging purposes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, thiserror::Error)]
pub enum TransportError {
    #[error("RequestTimeout")]
    Timeout,
    #[error("RequestError: {0}")]
    Request(String),
    #[error("BadRequest: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("RateLimited: {0}")]
    RateLimited(String),
    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("DecodeError: {0}")]
    Decode(String),
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        Self::Request(err.to_string())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::error::Error> for TransportError {
    fn from(err: serde_json::error::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
