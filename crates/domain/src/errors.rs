//! Error types used throughout the client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the OpenCircle client
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum OpenCircleError {
    /// Transport-level failure (connect, DNS, broken pipe)
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Backend rejected the credentials or session (401/403)
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    /// Backend throttled the client (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Backend failure (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Request was malformed or targeted a missing resource (4xx)
    #[error("Client error: {0}")]
    Client(String),

    /// Response body did not match any known shape
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted session storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OpenCircleError {
    /// Whether the failure is transient from the session's point of view.
    ///
    /// Transient errors say nothing about whether the session is still valid
    /// on the backend; definitive errors (`Rejected`, `Decode`, ...) do. The
    /// periodic session check keeps the local session alive on transient
    /// failures and forces logout on definitive ones.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Server(_) | Self::RateLimited(_)
        )
    }
}

/// Result type alias for OpenCircle operations
pub type Result<T> = std::result::Result<T, OpenCircleError>;
