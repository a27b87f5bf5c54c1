//! Shared test helpers for `leadflow-core` integration tests.
//!
//! Provides a scripted `LeadApi` double that counts calls and can hold a call
//! open, a `PersistedStore` that always fails, and domain fixtures.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use leadflow_core::{BatchRegistry, InMemoryStore, LeadApi, PersistedStore, SharedRegistry};
use leadflow_domain::{
    BatchSummary, DispatchOutcome, EnrolledByFilter, FilterMode, HistoryPage, HistoryQuery,
    LeadFlowError, LeadPage, LeadQuery, PaymentStatusFilter, ProcessOutcome, Product,
    Result as DomainResult, UploadFile, UploadReceipt,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Holds a fake call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    started: Notify,
    release: Notify,
}

impl Gate {
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.started.notify_one();
        self.release.notified().await;
    }
}

/// Scripted `LeadApi`. Each operation pops the next queued result; an
/// unscripted call fails with an internal error.
#[derive(Default)]
pub struct FakeLeadApi {
    products: Mutex<Vec<Product>>,
    uploads: Mutex<VecDeque<DomainResult<UploadReceipt>>>,
    processes: Mutex<VecDeque<DomainResult<ProcessOutcome>>>,
    sends: Mutex<VecDeque<DomainResult<DispatchOutcome>>>,
    summaries: Mutex<VecDeque<DomainResult<BatchSummary>>>,
    leads: Mutex<VecDeque<DomainResult<LeadPage>>>,
    history: Mutex<VecDeque<DomainResult<HistoryPage>>>,
    gates: Mutex<HashMap<&'static str, Arc<Gate>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeLeadApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_products(&self, products: Vec<Product>) {
        *self.products.lock() = products;
    }

    pub fn push_upload(&self, result: DomainResult<UploadReceipt>) {
        self.uploads.lock().push_back(result);
    }

    pub fn push_process(&self, result: DomainResult<ProcessOutcome>) {
        self.processes.lock().push_back(result);
    }

    pub fn push_send(&self, result: DomainResult<DispatchOutcome>) {
        self.sends.lock().push_back(result);
    }

    pub fn push_summary(&self, result: DomainResult<BatchSummary>) {
        self.summaries.lock().push_back(result);
    }

    pub fn push_leads(&self, result: DomainResult<LeadPage>) {
        self.leads.lock().push_back(result);
    }

    pub fn push_history(&self, result: DomainResult<HistoryPage>) {
        self.history.lock().push_back(result);
    }

    /// Hold every future `operation` call until [`Gate::release`].
    pub fn gate(&self, operation: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates.lock().insert(operation, gate.clone());
        gate
    }

    /// Number of calls made to `operation` ("upload", "process", "send", ...).
    pub fn calls_to(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.calls.lock().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn enter(&self, operation: &'static str, arg: &str) {
        self.calls.lock().push(format!("{operation}:{arg}"));
        let gate = self.gates.lock().get(operation).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }
}

fn next<T>(queue: &Mutex<VecDeque<DomainResult<T>>>, operation: &str) -> DomainResult<T> {
    queue
        .lock()
        .pop_front()
        .unwrap_or_else(|| Err(LeadFlowError::Internal(format!("unscripted {operation} call"))))
}

#[async_trait]
impl LeadApi for FakeLeadApi {
    async fn list_products(&self, active_only: bool) -> DomainResult<Vec<Product>> {
        self.enter("products", &active_only.to_string()).await;
        let products = self.products.lock().clone();
        Ok(products.into_iter().filter(|p| !active_only || p.active).collect())
    }

    async fn upload(&self, product_id: &str, _file: &UploadFile) -> DomainResult<UploadReceipt> {
        self.enter("upload", product_id).await;
        next(&self.uploads, "upload")
    }

    async fn process(&self, batch_id: &str) -> DomainResult<ProcessOutcome> {
        self.enter("process", batch_id).await;
        next(&self.processes, "process")
    }

    async fn send(&self, batch_id: &str) -> DomainResult<DispatchOutcome> {
        self.enter("send", batch_id).await;
        next(&self.sends, "send")
    }

    async fn fetch_summary(&self, batch_id: &str) -> DomainResult<BatchSummary> {
        self.enter("summary", batch_id).await;
        next(&self.summaries, "summary")
    }

    async fn fetch_leads(&self, batch_id: &str, _query: &LeadQuery) -> DomainResult<LeadPage> {
        self.enter("leads", batch_id).await;
        next(&self.leads, "leads")
    }

    async fn fetch_history(&self, query: &HistoryQuery) -> DomainResult<HistoryPage> {
        self.enter("history", &query.skip.to_string()).await;
        next(&self.history, "history")
    }
}

/// Store whose every operation fails.
pub struct FailingStore;

impl PersistedStore for FailingStore {
    fn get(&self, _key: &str) -> DomainResult<Option<String>> {
        Err(LeadFlowError::Storage("store offline".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> DomainResult<()> {
        Err(LeadFlowError::Storage("store offline".into()))
    }

    fn remove(&self, _key: &str) -> DomainResult<()> {
        Err(LeadFlowError::Storage("store offline".into()))
    }
}

pub fn registry_on(store: Arc<dyn PersistedStore>) -> SharedRegistry {
    let mut registry = BatchRegistry::new(store, 20);
    registry.load();
    registry.into_shared()
}

pub fn memory_registry() -> SharedRegistry {
    registry_on(Arc::new(InMemoryStore::new()))
}

pub fn product(id: &str) -> Product {
    Product {
        id: id.into(),
        name: format!("Product {id}"),
        kind: Some("pos".into()),
        active: true,
        enrolled_by_filter: EnrolledByFilter {
            values: vec!["6111 DIGITAL".into()],
            mode: FilterMode::Whitelist,
        },
        payment_status_filter: PaymentStatusFilter { remove: vec!["PAGO".into()] },
        consultant_ids: vec!["C1".into(), "C2".into()],
    }
}

pub fn spreadsheet(name: &str) -> UploadFile {
    UploadFile::new(name, b"<table></table>".to_vec())
}

pub fn receipt(batch_id: &str, total: u64) -> UploadReceipt {
    UploadReceipt { batch_id: batch_id.into(), file_name: "leads.xlsx".into(), total_records: total }
}

pub fn processed(valid: u64, duplicates: u64, filtered: u64) -> ProcessOutcome {
    ProcessOutcome {
        total_processed: valid + duplicates + filtered,
        valid_count: valid,
        duplicate_count: duplicates,
        filtered_count: filtered,
        filter_details: serde_json::json!({}),
    }
}

pub fn dispatched(ok: u64, failed: u64) -> DispatchOutcome {
    DispatchOutcome {
        dispatch_id: Some("D1".into()),
        total: ok + failed,
        sent_success_count: ok,
        sent_error_count: failed,
        consultants_used: vec!["C1".into(), "C2".into()],
    }
}

pub fn summary(batch_id: &str, valid: u64) -> BatchSummary {
    BatchSummary {
        batch_id: batch_id.into(),
        product_name: "Product P1".into(),
        total_records: valid + 20,
        valid_count: valid,
        duplicate_count: 15,
        filtered_count: 5,
        pending: 0,
        awaiting_dispatch: valid,
        sent: 0,
        errors: 0,
    }
}
