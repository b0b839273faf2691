//! Errors raised by port implementations.

use thiserror::Error;

/// Errors returned by completion clients
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No usable client for the configured provider.
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Provider throttled the request.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Request exceeded its timeout, in seconds.
    #[error("Request timeout after {0}s")]
    Timeout(u64),

    /// Connection-level failure.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Credentials rejected.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Response could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Any other provider failure.
    #[error("Provider error: {0}")]
    ApiError(String),
}

/// Errors raised by dataset collaborators
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset file could not be read or parsed.
    #[error("Failed to load dataset from {path}: {reason}")]
    Load {
        /// File that was read.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Checker could not decide.
    #[error("Answer could not be checked: {0}")]
    Unverifiable(String),
}

/// Errors raised by completion audit stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
