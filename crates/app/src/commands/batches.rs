//! Local batch registry commands

use leadflow_domain::{Batch, LeadFlowError, Result, StatusFilter};
use serde::Serialize;

use crate::context::AppContext;

/// Registry listing as shown to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct BatchListing {
    pub batches: Vec<Batch>,
    pub current_id: Option<String>,
    /// Registry changes are not being persisted.
    pub degraded: bool,
}

/// Registered batches, newest first, optionally narrowed by status and product.
pub fn list_batches(
    ctx: &AppContext,
    filter: StatusFilter,
    product_id: Option<&str>,
) -> BatchListing {
    let registry = ctx.registry.lock();
    let batches = registry
        .by_status(filter)
        .into_iter()
        .filter(|b| product_id.map_or(true, |p| b.product_id == p))
        .collect();

    BatchListing {
        batches,
        current_id: registry.current().map(|b| b.id.clone()),
        degraded: registry.is_degraded() || !ctx.durable,
    }
}

/// Make `batch_id` the current batch.
pub fn select_batch(ctx: &AppContext, batch_id: &str) -> Result<Batch> {
    ctx.registry
        .lock()
        .select(batch_id)
        .ok_or_else(|| LeadFlowError::NotFound(format!("batch {batch_id}")))
}

/// Forget a batch locally. The server keeps its leads.
pub fn remove_batch(ctx: &AppContext, batch_id: &str) -> Result<Batch> {
    ctx.registry
        .lock()
        .remove(batch_id)
        .ok_or_else(|| LeadFlowError::NotFound(format!("batch {batch_id}")))
}

/// Drop every registered batch. Returns how many were removed.
pub fn clear_batches(ctx: &AppContext) -> usize {
    let mut registry = ctx.registry.lock();
    let removed = registry.len();
    registry.clear();
    removed
}
