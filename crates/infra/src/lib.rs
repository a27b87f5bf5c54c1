//! # LeadFlow Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The lead server client (`LeadApiClient`) and token providers
//! - HTTP transport with retry for idempotent requests
//! - Persisted stores for the batch registry (SQLite and plain files)
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `leadflow-core`
//! - Contains all "impure" code (network, file system, SQLite)

pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientConfig, ApiError, LeadApiClient};
pub use database::{DbManager, SqliteStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use storage::FileStore;
