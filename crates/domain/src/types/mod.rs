//! Domain types and models

pub mod batch;
pub mod lead;
pub mod product;
pub mod remote;

pub use batch::{Batch, BatchCounts, BatchPatch, BatchStatus, StatusFilter};
pub use lead::{HistoryEntry, HistoryPage, HistoryQuery, Lead, LeadPage, LeadQuery, LeadStatus};
pub use product::{EnrolledByFilter, FilterMode, PaymentStatusFilter, Product};
pub use remote::{BatchSummary, DispatchOutcome, ProcessOutcome, UploadFile, UploadReceipt};
