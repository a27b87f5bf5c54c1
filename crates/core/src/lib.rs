//! # LeadFlow Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - The batch registry and the upload workflow
//! - The remote batch view used for reconciliation
//!
//! ## Architecture Principles
//! - Only depends on `leadflow-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod batch;

pub use batch::{
    BatchRegistry, InMemoryStore, LeadApi, PersistedStore, RegistrySnapshot, RemoteBatchView,
    SharedRegistry, UploadOrchestrator, WorkflowStage, WorkflowState,
};
