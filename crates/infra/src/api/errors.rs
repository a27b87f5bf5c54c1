//! API-specific error types
//!
//! Transport-level failures of lead server operations, and their mapping
//! onto the domain error at the port boundary.

use std::time::Duration;

use leadflow_domain::LeadFlowError;
use thiserror::Error;

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by server: {0}")]
    Validation(String),

    #[error("Nothing to send: {0}")]
    NothingToSend(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl From<LeadFlowError> for ApiError {
    fn from(err: LeadFlowError) -> Self {
        match err {
            LeadFlowError::Network(message) => Self::Network(message),
            LeadFlowError::Auth(message) => Self::Auth(message),
            LeadFlowError::Config(message) => Self::Config(message),
            LeadFlowError::NotFound(message) => Self::NotFound(message),
            LeadFlowError::Validation(message) | LeadFlowError::InvalidState(message) => {
                Self::Validation(message)
            }
            LeadFlowError::NothingToSend(message) => Self::NothingToSend(message),
            LeadFlowError::Server(message)
            | LeadFlowError::Storage(message)
            | LeadFlowError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<ApiError> for LeadFlowError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => Self::Auth(message),
            ApiError::RateLimit(message) | ApiError::Server(message) => Self::Server(message),
            ApiError::Decode(message) => Self::Server(format!("unexpected response: {message}")),
            ApiError::NotFound(message) => Self::NotFound(message),
            ApiError::Validation(message) | ApiError::Client(message) => Self::Validation(message),
            ApiError::NothingToSend(message) => Self::NothingToSend(message),
            ApiError::Network(message) => Self::Network(message),
            ApiError::Timeout(after) => Self::Network(format!("request timed out after {after:?}")),
            ApiError::Config(message) => Self::Config(message),
        }
    }
}
