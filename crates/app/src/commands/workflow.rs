//! Upload workflow commands: products, upload, process, send

use std::path::Path;

use leadflow_core::WorkflowState;
use leadflow_domain::{LeadFlowError, Product, Result, UploadFile};
use serde::Serialize;
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Outcome of a full upload, process and send run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub batch_id: String,
    pub uploaded: WorkflowState,
    pub processed: WorkflowState,
    pub sent: WorkflowState,
}

/// Products known to the server.
pub async fn list_products(ctx: &AppContext, active_only: bool) -> Result<Vec<Product>> {
    execute_command("workflow::list_products", || async move {
        ctx.api.list_products(active_only).await
    })
    .await
}

/// Upload a spreadsheet for `product_id` and register the new batch.
pub async fn upload_file(ctx: &AppContext, product_id: &str, path: &Path) -> Result<WorkflowState> {
    execute_command("workflow::upload_file", || async move {
        let product = find_product(ctx, product_id).await?;
        let file = read_upload(path).await?;

        ctx.orchestrator.reset();
        ctx.orchestrator.choose_product(product)?;
        ctx.orchestrator.choose_file(file)?;
        settled(ctx.orchestrator.upload().await?)
    })
    .await
}

/// Process a registered batch, the current one when `batch_id` is `None`.
pub async fn process_batch(ctx: &AppContext, batch_id: Option<&str>) -> Result<WorkflowState> {
    execute_command("workflow::process_batch", || async move {
        let id = resolve_batch_id(ctx, batch_id)?;
        ctx.orchestrator.resume(&id)?;
        settled(ctx.orchestrator.process().await?)
    })
    .await
}

/// Send a processed batch, the current one when `batch_id` is `None`.
pub async fn send_batch(ctx: &AppContext, batch_id: Option<&str>) -> Result<WorkflowState> {
    execute_command("workflow::send_batch", || async move {
        let id = resolve_batch_id(ctx, batch_id)?;
        ctx.orchestrator.resume(&id)?;
        settled(ctx.orchestrator.send().await?)
    })
    .await
}

/// Upload, process and send in one go. Stops at the first failed step; the
/// batch stays registered at whatever status it reached.
pub async fn run_pipeline(ctx: &AppContext, product_id: &str, path: &Path) -> Result<PipelineReport> {
    let uploaded = upload_file(ctx, product_id, path).await?;
    let batch_id = match &uploaded {
        WorkflowState::Uploaded(receipt) => receipt.batch_id.clone(),
        other => {
            return Err(LeadFlowError::Internal(format!("unexpected state after upload: {other:?}")))
        }
    };

    let processed = process_batch(ctx, Some(&batch_id)).await?;
    let sent = send_batch(ctx, Some(&batch_id)).await?;
    info!(batch_id = %batch_id, "Pipeline finished");

    Ok(PipelineReport { batch_id, uploaded, processed, sent })
}

async fn find_product(ctx: &AppContext, product_id: &str) -> Result<Product> {
    ctx.api
        .list_products(false)
        .await?
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| LeadFlowError::NotFound(format!("product {product_id}")))
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LeadFlowError::Validation(format!("not a file path: {}", path.display())))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LeadFlowError::Validation(format!("cannot read {}: {e}", path.display())))?;
    Ok(UploadFile::new(name, bytes))
}

fn resolve_batch_id(ctx: &AppContext, explicit: Option<&str>) -> Result<String> {
    if let Some(id) = explicit {
        return Ok(id.to_string());
    }
    ctx.registry
        .lock()
        .current()
        .map(|b| b.id.clone())
        .ok_or_else(|| LeadFlowError::Validation("no batch selected; pass a batch id".into()))
}

/// Remote failures are reported as a `Failed` state; surface them as errors.
fn settled(state: WorkflowState) -> Result<WorkflowState> {
    match state {
        WorkflowState::Failed { error, .. } => Err(error),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use leadflow_core::WorkflowStage;

    use super::*;

    #[test]
    fn failed_state_becomes_its_error() {
        let state = WorkflowState::Failed {
            stage: WorkflowStage::Send,
            error: LeadFlowError::Network("reset".into()),
        };
        assert_eq!(settled(state), Err(LeadFlowError::Network("reset".into())));
        assert_eq!(settled(WorkflowState::AwaitingFile), Ok(WorkflowState::AwaitingFile));
    }

    #[tokio::test]
    async fn unreadable_path_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_upload(&dir.path().join("missing.xlsx")).await.unwrap_err();
        assert!(matches!(err, LeadFlowError::Validation(msg) if msg.contains("missing.xlsx")));
    }
}
