//! Provider API errors and their retry classification.

use thiserror::Error;

use crate::domain::ports::CompletionError;

/// Errors that can occur when talking to a model provider's HTTP API
#[derive(Error, Debug)]
pub enum LlmApiError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry after waiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider encountered an internal error
    #[error("API server error: {0}")]
    ServerError(String),

    /// Provider is overloaded, retry later
    #[error("API server overloaded")]
    Overloaded,

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out waiting for response
    #[error("Timeout after {0}s waiting for response")]
    Timeout(u64),

    /// Response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Unknown error occurred
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmApiError {
    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded
                | Self::ServerError(_)
                | Self::Overloaded
                | Self::Network(_)
                | Self::Timeout(_)
        )
    }

    /// Returns true if retrying can never succeed
    pub const fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Map an HTTP status code and response body to an error
    ///
    /// - 400: Invalid request
    /// - 401, 403: Authentication failed
    /// - 429: Rate limit exceeded
    /// - 529: Overloaded
    /// - other 5xx: Server error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            529 => Self::Overloaded,
            500..=599 => Self::ServerError(body),
            _ => Self::Unknown(format!("HTTP {status}: {body}")),
        }
    }

    /// Classify a transport failure.
    pub fn from_reqwest(error: &reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if error.is_decode() {
            Self::MalformedResponse(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<LlmApiError> for CompletionError {
    fn from(err: LlmApiError) -> Self {
        match err {
            LlmApiError::AuthenticationFailed(msg) => Self::AuthError(msg),
            LlmApiError::RateLimitExceeded => {
                Self::RateLimitExceeded("provider returned 429".to_string())
            }
            LlmApiError::Timeout(secs) => Self::Timeout(secs),
            LlmApiError::Network(msg) => Self::NetworkError(msg),
            LlmApiError::MalformedResponse(msg) => Self::MalformedResponse(msg),
            other => Self::ApiError(other.to_string()),
        }
    }
}
