//! Lead server client
//!
//! HTTP adapter for the remote lead server: bearer authentication, status
//! classification and the wire payload mapping behind the `LeadApi` port.
//!
//! # Architecture
//!
//! - Built on [`crate::http::HttpClient`] (no direct reqwest clients)
//! - Token providers behind [`AccessTokenProvider`], refreshed after a 401
//! - Non-idempotent calls (upload, process, send) are sent once

pub mod auth;
pub mod client;
pub mod errors;
pub mod leads;
mod types;

pub use auth::{AccessTokenProvider, PasswordTokenProvider, StaticTokenProvider};
pub use client::{ApiClient, ApiClientConfig};
pub use errors::ApiError;
pub use leads::LeadApiClient;
