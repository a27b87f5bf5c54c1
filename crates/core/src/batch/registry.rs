//! Batch registry - the client-owned cache of known batches
//!
//! The registry is the local source of truth for workflow progress. It keeps
//! the most recently added batches (newest first), persists them as a single
//! versioned envelope and republishes a snapshot after every mutation.
//!
//! Persistence failures never reach callers: the first failure switches the
//! registry to memory-only operation for the rest of the session.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use leadflow_domain::constants::{BATCH_STORE_FORMAT_VERSION, BATCH_STORE_KEY};
use leadflow_domain::{Batch, BatchPatch, LeadFlowError, Result, StatusFilter};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::ports::PersistedStore;

/// Registry shared between the orchestrator, the remote view and commands.
///
/// Critical sections are short and never span an `.await`.
pub type SharedRegistry = Arc<Mutex<BatchRegistry>>;

/// State published to subscribers after each mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    /// Batches newest first.
    pub batches: Vec<Batch>,
    /// Id of the current batch.
    pub current_id: Option<String>,
    /// Changes are no longer being persisted.
    pub degraded: bool,
}

impl RegistrySnapshot {
    /// The current batch, if one is selected.
    pub fn current(&self) -> Option<&Batch> {
        let id = self.current_id.as_deref()?;
        self.batches.iter().find(|b| b.id == id)
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    batches: &'a [Batch],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[serde(default)]
    batches: Vec<Value>,
}

/// Capped, persisted list of known batches with a single current batch.
pub struct BatchRegistry {
    store: Arc<dyn PersistedStore>,
    batches: Vec<Batch>,
    current_id: Option<String>,
    max_batches: usize,
    degraded: bool,
    updates: watch::Sender<RegistrySnapshot>,
}

impl BatchRegistry {
    /// Create an empty registry. Call [`BatchRegistry::load`] to read the
    /// persisted batches.
    pub fn new(store: Arc<dyn PersistedStore>, max_batches: usize) -> Self {
        let (updates, _) = watch::channel(RegistrySnapshot::default());
        Self {
            store,
            batches: Vec::new(),
            current_id: None,
            max_batches: max_batches.max(1),
            degraded: false,
            updates,
        }
    }

    /// Wrap the registry for sharing across services.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Missing, malformed or unknown-version data yields an empty registry.
    /// The most recently added batch becomes current.
    pub fn load(&mut self) {
        let raw = if self.degraded {
            None
        } else {
            match self.store.get(BATCH_STORE_KEY) {
                Ok(raw) => raw,
                Err(err) => {
                    self.mark_degraded("load", &err);
                    None
                }
            }
        };

        self.batches = raw.map(|raw| self.decode(&raw)).unwrap_or_default();
        self.current_id = self.batches.first().map(|b| b.id.clone());
        info!(count = self.batches.len(), current = ?self.current_id, "Batch registry loaded");
        self.publish();
    }

    /// Register a batch at the head of the list and make it current.
    ///
    /// An existing entry with the same id is replaced. Fails only for a batch
    /// without `id` or `product_id`.
    pub fn add(&mut self, mut batch: Batch) -> Result<Batch> {
        if batch.id.trim().is_empty() {
            return Err(LeadFlowError::Validation("batch id must not be empty".into()));
        }
        if batch.product_id.trim().is_empty() {
            return Err(LeadFlowError::Validation(format!(
                "batch {} has no product id",
                batch.id
            )));
        }

        let now = Utc::now();
        let created_at = *batch.created_at.get_or_insert(now);
        batch.updated_at.get_or_insert(created_at);

        let replaced = self.remove_entry(&batch.id).is_some();
        self.batches.insert(0, batch.clone());
        let evicted = self.truncate();
        self.current_id = Some(batch.id.clone());

        info!(
            batch_id = %batch.id,
            product_id = %batch.product_id,
            status = %batch.status,
            replaced,
            evicted,
            "Batch registered"
        );
        self.persist();
        self.publish();
        Ok(batch)
    }

    /// Merge `patch` into the batch with `id`.
    ///
    /// Unknown ids are a no-op returning `None`. A status that would regress
    /// or skip a step is ignored while the counts are still merged.
    pub fn update(&mut self, id: &str, patch: BatchPatch) -> Option<Batch> {
        let Some(batch) = self.batches.iter_mut().find(|b| b.id == id) else {
            debug!(batch_id = %id, "Update for unknown batch ignored");
            return None;
        };

        let mut changed = false;
        if let Some(target) = patch.status {
            if batch.status.can_advance_to(target) {
                changed |= batch.status != target;
                batch.status = target;
            } else {
                warn!(
                    batch_id = %id,
                    from = %batch.status,
                    to = %target,
                    "Illegal batch status transition ignored"
                );
            }
        }
        changed |= merge(&mut batch.total_records, patch.total_records);
        changed |= merge(&mut batch.valid_count, patch.valid_count);
        changed |= merge(&mut batch.duplicate_count, patch.duplicate_count);
        changed |= merge(&mut batch.filtered_count, patch.filtered_count);

        if changed {
            batch.updated_at = Some(Utc::now());
        }
        let updated = batch.clone();

        if changed {
            debug!(batch_id = %id, status = %updated.status, "Batch updated");
            self.persist();
            self.publish();
        }
        Some(updated)
    }

    /// Delete a batch; unsets the current batch if it was current.
    pub fn remove(&mut self, id: &str) -> Option<Batch> {
        let removed = self.remove_entry(id)?;
        if self.current_id.as_deref() == Some(id) {
            self.current_id = None;
        }
        info!(batch_id = %id, "Batch removed");
        self.persist();
        self.publish();
        Some(removed)
    }

    /// Make the batch with `id` current, or unset current when unknown.
    pub fn select(&mut self, id: &str) -> Option<Batch> {
        let selected = self.get(id).cloned();
        self.current_id = selected.as_ref().map(|b| b.id.clone());
        self.publish();
        selected
    }

    /// Forget every batch and persist the empty state.
    pub fn clear(&mut self) {
        let count = self.batches.len();
        self.batches.clear();
        self.current_id = None;
        info!(count, "Batch registry cleared");
        self.persist();
        self.publish();
    }

    /// Look up a batch by id.
    pub fn get(&self, id: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn current(&self) -> Option<&Batch> {
        self.get(self.current_id.as_deref()?)
    }

    /// All batches, newest first.
    pub fn list(&self) -> &[Batch] {
        &self.batches
    }

    /// Batches matching `filter`, list order preserved.
    pub fn by_status(&self, filter: impl Into<StatusFilter>) -> Vec<Batch> {
        let filter = filter.into();
        self.batches.iter().filter(|b| filter.matches(b.status)).cloned().collect()
    }

    /// Batches uploaded for `product_id`, list order preserved.
    pub fn by_product(&self, product_id: &str) -> Vec<Batch> {
        self.batches.iter().filter(|b| b.product_id == product_id).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Whether persistence has failed and the registry is memory-only.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Copy of the current state, as published to subscribers.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            batches: self.batches.clone(),
            current_id: self.current_id.clone(),
            degraded: self.degraded,
        }
    }

    /// Receive a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.updates.subscribe()
    }

    fn decode(&self, raw: &str) -> Vec<Batch> {
        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => {
                debug!("Legacy batch list found, will rewrite as versioned envelope");
                entries
            }
            Ok(value @ Value::Object(_)) => match serde_json::from_value::<Envelope>(value) {
                Ok(envelope) if envelope.version == BATCH_STORE_FORMAT_VERSION => {
                    envelope.batches
                }
                Ok(envelope) => {
                    warn!(version = envelope.version, "Unsupported batch store version, ignoring");
                    return Vec::new();
                }
                Err(err) => {
                    warn!(error = %err, "Malformed batch store envelope, starting empty");
                    return Vec::new();
                }
            },
            Ok(_) => {
                warn!("Unexpected batch store payload, starting empty");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, "Corrupt batch store payload, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut batches = Vec::with_capacity(entries.len().min(self.max_batches));
        for entry in entries {
            match serde_json::from_value::<Batch>(entry) {
                Ok(batch) if batch.id.is_empty() || batch.product_id.is_empty() => {
                    warn!("Skipping persisted batch without id or product id");
                }
                Ok(batch) => {
                    if seen.insert(batch.id.clone()) {
                        batches.push(batch);
                    }
                }
                Err(err) => warn!(error = %err, "Skipping unreadable persisted batch"),
            }
        }
        batches.truncate(self.max_batches);
        batches
    }

    fn remove_entry(&mut self, id: &str) -> Option<Batch> {
        let index = self.batches.iter().position(|b| b.id == id)?;
        Some(self.batches.remove(index))
    }

    fn truncate(&mut self) -> usize {
        let evicted = self.batches.len().saturating_sub(self.max_batches);
        if evicted > 0 {
            self.batches.truncate(self.max_batches);
            if let Some(current) = self.current_id.as_deref() {
                if self.get(current).is_none() {
                    self.current_id = None;
                }
            }
        }
        evicted
    }

    fn persist(&mut self) {
        if self.degraded {
            return;
        }
        let envelope = EnvelopeRef { version: BATCH_STORE_FORMAT_VERSION, batches: &self.batches };
        let result = serde_json::to_string(&envelope)
            .map_err(|e| LeadFlowError::Internal(format!("serialize batches: {e}")))
            .and_then(|json| self.store.set(BATCH_STORE_KEY, &json));
        if let Err(err) = result {
            self.mark_degraded("save", &err);
        }
    }

    fn mark_degraded(&mut self, operation: &str, err: &LeadFlowError) {
        if !self.degraded {
            error!(
                operation,
                error = %err,
                "Batch store unavailable, continuing in memory-only mode"
            );
            self.degraded = true;
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

fn merge(slot: &mut Option<u64>, value: Option<u64>) -> bool {
    match value {
        Some(value) if *slot != Some(value) => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}
