//! # LeadFlow App
//!
//! Application layer - operator commands and the `leadflow` binary.
//!
//! This crate contains:
//! - Commands (CLI → workflow bridge)
//! - Application context (dependency injection)
//! - Logging setup and command helpers
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod cli;
pub mod commands;
pub mod context;
pub mod utils;

pub use context::AppContext;
