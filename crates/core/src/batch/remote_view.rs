//! Read path over the server's view of a batch
//!
//! The server owns the counts; the registry owns local workflow progress.
//! Every successful summary fetch writes the server counts back into the
//! registry and moves the cached status forward when the per-lead counts
//! prove another session already reached a later stage.

use std::sync::Arc;

use leadflow_domain::{
    BatchPatch, BatchSummary, HistoryPage, HistoryQuery, LeadPage, LeadQuery, LeadStatus, Result,
};
use tracing::{debug, info, instrument};

use super::ports::LeadApi;
use super::registry::SharedRegistry;

/// Server-side counts and leads for registered batches.
pub struct RemoteBatchView {
    api: Arc<dyn LeadApi>,
    registry: SharedRegistry,
}

impl RemoteBatchView {
    /// Create a view that reconciles into `registry`.
    pub fn new(api: Arc<dyn LeadApi>, registry: SharedRegistry) -> Self {
        Self { api, registry }
    }

    /// Fetch authoritative counts and reconcile the cached batch.
    ///
    /// `NotFound` is returned as is; the local entry is kept.
    #[instrument(skip(self))]
    pub async fn fetch_summary(&self, batch_id: &str) -> Result<BatchSummary> {
        let summary = self.api.fetch_summary(batch_id).await?;
        self.reconcile(batch_id, &summary);
        Ok(summary)
    }

    /// One page of leads for a batch.
    #[instrument(skip(self))]
    pub async fn fetch_leads(&self, batch_id: &str, query: LeadQuery) -> Result<LeadPage> {
        let page = self.api.fetch_leads(batch_id, &query).await?;
        debug!(
            batch_id = %batch_id,
            returned = page.returned(),
            total = page.total,
            "Leads fetched"
        );
        Ok(page)
    }

    /// Candidates already dispatched to the CRM.
    #[instrument(skip(self))]
    pub async fn fetch_history(&self, query: HistoryQuery) -> Result<HistoryPage> {
        self.api.fetch_history(&query).await
    }

    /// Best locally known lead count for a listing, used for "showing N of M".
    pub fn known_total(&self, batch_id: &str, status: Option<LeadStatus>) -> Option<u64> {
        let registry = self.registry.lock();
        let batch = registry.get(batch_id)?;
        match status {
            None => batch.total_records,
            Some(LeadStatus::Duplicate) => batch.duplicate_count,
            Some(LeadStatus::Filtered) => batch.filtered_count,
            Some(_) => None,
        }
    }

    fn reconcile(&self, batch_id: &str, summary: &BatchSummary) {
        let mut registry = self.registry.lock();
        let Some(cached) = registry.get(batch_id).map(|b| b.status) else {
            debug!(batch_id = %batch_id, "Summary for unregistered batch, nothing to reconcile");
            return;
        };

        registry.update(batch_id, BatchPatch::reconciled(summary));

        let Some(target) = summary.implied_status() else {
            return;
        };
        let mut status = cached;
        while status < target {
            let Some(next) = status.next() else {
                break;
            };
            registry.update(batch_id, BatchPatch::status(next));
            status = next;
        }
        if status != cached {
            info!(batch_id = %batch_id, from = %cached, to = %status, "Batch status reconciled");
        }
    }
}
