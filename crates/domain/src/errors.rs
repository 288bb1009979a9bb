//! Domain error types

use thiserror::Error;

/// Top-level error type for AdsPilot operations
#[derive(Debug, Error)]
pub enum AdsPilotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for AdsPilot operations
pub type Result<T> = std::result::Result<T, AdsPilotError>;

impl AdsPilotError {
    /// Whether a retry of the failed operation could reasonably succeed.
    ///
    /// Only transport-level failures qualify; configuration, auth and
    /// input errors require caller intervention first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}
