//! Port interfaces for the batch workflow
//!
//! These traits define the boundaries between the batch lifecycle logic and
//! the infrastructure that stores the registry and talks to the lead server.

use async_trait::async_trait;
use leadflow_domain::{
    BatchSummary, DispatchOutcome, HistoryPage, HistoryQuery, LeadPage, LeadQuery, ProcessOutcome,
    Product, Result, UploadFile, UploadReceipt,
};

/// Durable key/value surface backing the batch registry.
///
/// Access is synchronous and local; implementations must not perform network
/// I/O.
pub trait PersistedStore: Send + Sync {
    /// Read the blob stored under `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Remote lead server operations consumed by the workflow and read views.
#[async_trait]
pub trait LeadApi: Send + Sync {
    /// Product catalogue, optionally restricted to active products
    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>>;

    /// Upload a spreadsheet for `product_id`; the server assigns the batch id
    async fn upload(&self, product_id: &str, file: &UploadFile) -> Result<UploadReceipt>;

    /// Deduplicate and filter the leads of a batch
    async fn process(&self, batch_id: &str) -> Result<ProcessOutcome>;

    /// Dispatch the valid leads of a batch to the CRM
    async fn send(&self, batch_id: &str) -> Result<DispatchOutcome>;

    /// Authoritative counts for a batch
    async fn fetch_summary(&self, batch_id: &str) -> Result<BatchSummary>;

    /// One page of leads, optionally filtered by lead status
    async fn fetch_leads(&self, batch_id: &str, query: &LeadQuery) -> Result<LeadPage>;

    /// Candidates already dispatched to the CRM
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage>;
}
