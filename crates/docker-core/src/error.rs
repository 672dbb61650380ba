//! Error types for Docker Engine API operations.
//!
//! A single error enum is shared by every client crate. Transport failures,
//! daemon status codes and body decoding problems all land here, so callers
//! can match on one type regardless of which endpoint they hit.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for Docker Engine API operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The daemon could not be reached or reported itself unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP request failed below the API layer
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request deadline expired
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Request was cancelled through its [`RequestContext`](crate::RequestContext)
    #[error("Request cancelled")]
    Cancelled,

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Daemon rejected the request parameters (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Daemon refused the request in its current state (406)
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// Conflict with the daemon's current state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authentication or authorization failure (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code returned by the daemon
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// Request payload could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Docker Engine API operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotAcceptable(_) => "NOT_ACCEPTABLE",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Api { .. } => "API_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Map a non-success HTTP status and its message to an error.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::NOT_ACCEPTABLE => Self::NotAcceptable(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => {
                Self::ServiceUnavailable(format!("daemon temporarily unavailable: {message}"))
            }
            status if status.is_server_error() => {
                Self::ServiceUnavailable(format!("daemon error {status}: {message}"))
            }
            status => Self::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
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
        Self::ValidationError(err.to_string())
    }
}
