//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for LeadFlow
///
/// The variants follow the failure taxonomy of the batch workflow:
/// validation problems are rejected before any remote call, remote failures
/// are split by whether a retry can help, and storage problems never reach
/// the operator (the registry degrades instead).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LeadFlowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Nothing to send: {0}")]
    NothingToSend(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LeadFlowError {
    /// Whether repeating the same step may succeed without operator changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server(_) | Self::Network(_) | Self::Auth(_))
    }

    /// Stable label for structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::NothingToSend(_) => "nothing_to_send",
            Self::InvalidState(_) => "invalid_state",
            Self::Server(_) => "server",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for LeadFlow operations
pub type Result<T> = std::result::Result<T, LeadFlowError>;
