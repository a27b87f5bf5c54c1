//! Upload orchestrator - drives one batch through upload, process and send
//!
//! The workflow is an explicit state machine. Each remote step is reachable
//! from exactly one prior state, and the state moves to its in-progress
//! variant before the call is issued, so a second concurrent invocation is
//! rejected by the precondition check instead of a lock held across the
//! call.
//!
//! Methods return `Err` when a precondition rejects the call (nothing
//! changed, nothing sent). Remote failures are not errors at this boundary:
//! they become [`WorkflowState::Failed`] and the same step can be retried.

use std::sync::Arc;

use leadflow_domain::{
    Batch, BatchPatch, BatchStatus, DispatchOutcome, LeadFlowError, ProcessOutcome, Product,
    Result, UploadFile, UploadReceipt,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::ports::LeadApi;
use super::registry::SharedRegistry;

/// Remote step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    Upload,
    Process,
    Send,
}

leadflow_domain::impl_domain_status_conversions!(WorkflowStage {
    Upload => "upload",
    Process => "process",
    Send => "send",
});

/// Current step of the upload workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowState {
    SelectingProduct,
    AwaitingFile,
    Uploading,
    Uploaded(UploadReceipt),
    Processing,
    Processed(ProcessOutcome),
    Sending,
    Sent(DispatchOutcome),
    Failed { stage: WorkflowStage, error: LeadFlowError },
}

impl WorkflowState {
    /// A remote call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Uploading | Self::Processing | Self::Sending)
    }

    fn failed_at(&self, expected: WorkflowStage) -> bool {
        matches!(self, Self::Failed { stage, .. } if *stage == expected)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SelectingProduct => "selecting_product",
            Self::AwaitingFile => "awaiting_file",
            Self::Uploading => "uploading",
            Self::Uploaded(_) => "uploaded",
            Self::Processing => "processing",
            Self::Processed(_) => "processed",
            Self::Sending => "sending",
            Self::Sent(_) => "sent",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug)]
struct Workflow {
    state: WorkflowState,
    product: Option<Product>,
    file: Option<UploadFile>,
    batch_id: Option<String>,
    processed: Option<ProcessOutcome>,
    /// Bumped by `reset`/`resume`; results of calls started under an older
    /// epoch no longer touch the workflow.
    epoch: u64,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            state: WorkflowState::SelectingProduct,
            product: None,
            file: None,
            batch_id: None,
            processed: None,
            epoch: 0,
        }
    }
}

impl Workflow {
    fn rejected(&self, action: &str) -> LeadFlowError {
        LeadFlowError::InvalidState(format!("cannot {action} while {}", self.state.name()))
    }
}

/// Batch lifecycle workflow service
pub struct UploadOrchestrator {
    api: Arc<dyn LeadApi>,
    registry: SharedRegistry,
    workflow: Mutex<Workflow>,
}

impl UploadOrchestrator {
    /// Create a new orchestrator
    pub fn new(api: Arc<dyn LeadApi>, registry: SharedRegistry) -> Self {
        Self { api, registry, workflow: Mutex::new(Workflow::default()) }
    }

    pub fn state(&self) -> WorkflowState {
        self.workflow.lock().state.clone()
    }

    /// Id of the batch the workflow is driving, once uploaded or resumed.
    pub fn batch_id(&self) -> Option<String> {
        self.workflow.lock().batch_id.clone()
    }

    pub fn product(&self) -> Option<Product> {
        self.workflow.lock().product.clone()
    }

    /// Pick the product whose rules apply to the next upload.
    pub fn choose_product(&self, product: Product) -> Result<()> {
        let mut wf = self.workflow.lock();
        if !matches!(wf.state, WorkflowState::SelectingProduct | WorkflowState::AwaitingFile) {
            return Err(wf.rejected("choose a product"));
        }
        if !product.active {
            return Err(LeadFlowError::Validation(format!(
                "product {} is inactive",
                product.name
            )));
        }
        if !product.has_rules() {
            return Err(LeadFlowError::Validation(format!(
                "product {} has no filter rules or consultants configured",
                product.name
            )));
        }

        info!(product_id = %product.id, "Product chosen");
        wf.product = Some(product);
        wf.file = None;
        wf.state = WorkflowState::AwaitingFile;
        Ok(())
    }

    /// Pick the spreadsheet to upload. Wrong extensions leave the state as is.
    pub fn choose_file(&self, file: UploadFile) -> Result<()> {
        let mut wf = self.workflow.lock();
        if !matches!(wf.state, WorkflowState::AwaitingFile)
            && !wf.state.failed_at(WorkflowStage::Upload)
        {
            return Err(wf.rejected("choose a file"));
        }
        if !file.has_allowed_extension() {
            return Err(LeadFlowError::Validation(format!(
                "unsupported file {}: expected .xls, .xlsx or .html",
                file.name
            )));
        }

        info!(file_name = %file.name, size = file.bytes.len(), "File chosen");
        wf.file = Some(file);
        wf.state = WorkflowState::AwaitingFile;
        Ok(())
    }

    /// Upload the chosen file and register the resulting batch.
    #[instrument(skip(self))]
    pub async fn upload(&self) -> Result<WorkflowState> {
        let (product, file, epoch) = {
            let mut wf = self.workflow.lock();
            if !matches!(wf.state, WorkflowState::AwaitingFile)
                && !wf.state.failed_at(WorkflowStage::Upload)
            {
                return Err(wf.rejected("upload"));
            }
            let product = wf
                .product
                .clone()
                .ok_or_else(|| LeadFlowError::Validation("no product selected".into()))?;
            let file = wf
                .file
                .clone()
                .ok_or_else(|| LeadFlowError::Validation("no file selected".into()))?;
            wf.state = WorkflowState::Uploading;
            (product, file, wf.epoch)
        };

        let next = match self.api.upload(&product.id, &file).await {
            Ok(receipt) => {
                let registered = self.registry.lock().add(Batch::uploaded(&receipt, &product));
                match registered {
                    Ok(batch) => {
                        info!(
                            batch_id = %batch.id,
                            total_records = receipt.total_records,
                            "Batch uploaded"
                        );
                        WorkflowState::Uploaded(receipt)
                    }
                    Err(error) => WorkflowState::Failed { stage: WorkflowStage::Upload, error },
                }
            }
            Err(error) => {
                warn!(error = %error, "Upload failed");
                WorkflowState::Failed { stage: WorkflowStage::Upload, error }
            }
        };

        let batch_id = match &next {
            WorkflowState::Uploaded(receipt) => Some(receipt.batch_id.clone()),
            _ => None,
        };
        self.finish(epoch, next, |wf| {
            if batch_id.is_some() {
                wf.batch_id = batch_id;
                wf.processed = None;
            }
        })
    }

    /// Deduplicate and filter the uploaded batch.
    #[instrument(skip(self))]
    pub async fn process(&self) -> Result<WorkflowState> {
        let (batch_id, epoch) = {
            let mut wf = self.workflow.lock();
            if !matches!(wf.state, WorkflowState::Uploaded(_))
                && !wf.state.failed_at(WorkflowStage::Process)
            {
                return Err(wf.rejected("process"));
            }
            let batch_id = wf.batch_id.clone().ok_or_else(|| wf.rejected("process"))?;
            if let Some(status) = self.registry.lock().get(&batch_id).map(|b| b.status) {
                if status >= BatchStatus::Processed {
                    return Err(LeadFlowError::InvalidState(format!(
                        "batch {batch_id} is already {status}"
                    )));
                }
            }
            wf.state = WorkflowState::Processing;
            (batch_id, wf.epoch)
        };

        let next = match self.api.process(&batch_id).await {
            Ok(outcome) => {
                self.registry.lock().update(&batch_id, BatchPatch::processed(&outcome));
                info!(
                    batch_id = %batch_id,
                    valid = outcome.valid_count,
                    duplicates = outcome.duplicate_count,
                    filtered = outcome.filtered_count,
                    "Batch processed"
                );
                WorkflowState::Processed(outcome)
            }
            Err(error) => {
                warn!(batch_id = %batch_id, error = %error, "Processing failed");
                WorkflowState::Failed { stage: WorkflowStage::Process, error }
            }
        };

        let processed = match &next {
            WorkflowState::Processed(outcome) => Some(outcome.clone()),
            _ => None,
        };
        self.finish(epoch, next, |wf| {
            if processed.is_some() {
                wf.processed = processed;
            }
        })
    }

    /// Dispatch the valid leads of the processed batch to the CRM.
    #[instrument(skip(self))]
    pub async fn send(&self) -> Result<WorkflowState> {
        let (batch_id, epoch) = {
            let mut wf = self.workflow.lock();
            if !matches!(wf.state, WorkflowState::Processed(_))
                && !wf.state.failed_at(WorkflowStage::Send)
            {
                return Err(wf.rejected("send"));
            }
            let batch_id = wf.batch_id.clone().ok_or_else(|| wf.rejected("send"))?;

            let cached = self.registry.lock().get(&batch_id).cloned();
            if cached.as_ref().is_some_and(|b| b.status == BatchStatus::Sent) {
                return Err(LeadFlowError::InvalidState(format!(
                    "batch {batch_id} was already sent"
                )));
            }
            let valid_count = cached
                .and_then(|b| b.valid_count)
                .or_else(|| wf.processed.as_ref().map(|p| p.valid_count))
                .unwrap_or(0);
            if valid_count == 0 {
                return Err(LeadFlowError::NothingToSend(format!(
                    "batch {batch_id} has no valid leads"
                )));
            }

            wf.state = WorkflowState::Sending;
            (batch_id, wf.epoch)
        };

        let next = match self.api.send(&batch_id).await {
            Ok(outcome) => {
                self.registry.lock().update(&batch_id, BatchPatch::status(BatchStatus::Sent));
                info!(
                    batch_id = %batch_id,
                    sent = outcome.sent_success_count,
                    failed = outcome.sent_error_count,
                    consultants = outcome.consultants_used.len(),
                    "Batch sent"
                );
                WorkflowState::Sent(outcome)
            }
            Err(error) => {
                warn!(batch_id = %batch_id, error = %error, "Dispatch failed");
                WorkflowState::Failed { stage: WorkflowStage::Send, error }
            }
        };

        self.finish(epoch, next, |_| {})
    }

    /// Return to product selection. The registry is left untouched.
    pub fn reset(&self) {
        let mut wf = self.workflow.lock();
        let epoch = wf.epoch + 1;
        *wf = Workflow { epoch, ..Workflow::default() };
        info!("Workflow reset");
    }

    /// Re-enter the workflow for a registered batch at its persisted status.
    ///
    /// `Uploaded` resumes ready to process and `Processed` ready to send. A
    /// sent batch is finished and cannot be resumed.
    pub fn resume(&self, batch_id: &str) -> Result<WorkflowState> {
        let mut wf = self.workflow.lock();
        if wf.state.is_busy() {
            return Err(wf.rejected("resume"));
        }

        let batch = self
            .registry
            .lock()
            .select(batch_id)
            .ok_or_else(|| LeadFlowError::NotFound(format!("batch {batch_id}")))?;

        let (state, processed) = match batch.status {
            BatchStatus::Uploaded => (
                WorkflowState::Uploaded(UploadReceipt {
                    batch_id: batch.id.clone(),
                    file_name: batch.file_name.clone(),
                    total_records: batch.total_records.unwrap_or_default(),
                }),
                None,
            ),
            BatchStatus::Processed => {
                let counts = batch.counts().unwrap_or_default();
                let outcome = ProcessOutcome {
                    total_processed: counts.total_records,
                    valid_count: counts.valid_count,
                    duplicate_count: counts.duplicate_count,
                    filtered_count: counts.filtered_count,
                    filter_details: serde_json::Value::Null,
                };
                (WorkflowState::Processed(outcome.clone()), Some(outcome))
            }
            BatchStatus::Sent => {
                return Err(LeadFlowError::InvalidState(format!(
                    "batch {batch_id} was already sent"
                )));
            }
        };

        info!(batch_id = %batch.id, status = %batch.status, "Workflow resumed");
        let epoch = wf.epoch + 1;
        *wf = Workflow {
            state: state.clone(),
            product: None,
            file: None,
            batch_id: Some(batch.id),
            processed,
            epoch,
        };
        Ok(state)
    }

    fn finish(
        &self,
        epoch: u64,
        next: WorkflowState,
        apply: impl FnOnce(&mut Workflow),
    ) -> Result<WorkflowState> {
        let mut wf = self.workflow.lock();
        if wf.epoch == epoch {
            apply(&mut wf);
            wf.state = next.clone();
        } else {
            info!(result = next.name(), "Workflow was reset during the call, result not applied");
        }
        Ok(next)
    }
}
