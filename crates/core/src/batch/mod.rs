//! Batch lifecycle
//!
//! This module provides the batch registry, the upload workflow that drives
//! a batch through upload, process and send, and the read view that
//! reconciles cached batches with the server.

pub mod orchestrator;
pub mod ports;
pub mod registry;
pub mod remote_view;
pub mod store;

pub use orchestrator::{UploadOrchestrator, WorkflowStage, WorkflowState};
pub use ports::{LeadApi, PersistedStore};
pub use registry::{BatchRegistry, RegistrySnapshot, SharedRegistry};
pub use remote_view::RemoteBatchView;
pub use store::InMemoryStore;
