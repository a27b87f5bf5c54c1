//! Read-only views over server-side batch state

use leadflow_domain::{BatchSummary, HistoryPage, HistoryQuery, LeadPage, LeadQuery, Result};
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// A page of leads plus the "showing N of M" hint when it is partial.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListing {
    #[serde(flatten)]
    pub page: LeadPage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,
}

/// Server counts for a batch; the registry entry is reconciled as a side effect.
pub async fn batch_summary(ctx: &AppContext, batch_id: &str) -> Result<BatchSummary> {
    execute_command("remote::batch_summary", || ctx.remote.fetch_summary(batch_id)).await
}

pub async fn batch_leads(ctx: &AppContext, batch_id: &str, query: LeadQuery) -> Result<LeadListing> {
    execute_command("remote::batch_leads", || async move {
        let page = ctx.remote.fetch_leads(batch_id, query).await?;
        let coverage = page.coverage_hint(ctx.remote.known_total(batch_id, query.status));
        Ok(LeadListing { page, coverage })
    })
    .await
}

pub async fn dispatch_history(ctx: &AppContext, query: HistoryQuery) -> Result<HistoryPage> {
    execute_command("remote::dispatch_history", || ctx.remote.fetch_history(query)).await
}
