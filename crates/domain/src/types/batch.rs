//! Batch (lote) types: one uploaded spreadsheet on its way to the CRM

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::remote::{BatchSummary, ProcessOutcome, UploadReceipt};
use super::Product;

/// Lifecycle status of a batch.
///
/// Ordered `Uploaded < Processed < Sent`; a batch only ever moves one step
/// forward at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Uploaded,
    Processed,
    Sent,
}

crate::impl_domain_status_conversions!(BatchStatus {
    Uploaded => "uploaded",
    Processed => "processed",
    Sent => "sent",
});

impl BatchStatus {
    /// The status that directly follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Uploaded => Some(Self::Processed),
            Self::Processed => Some(Self::Sent),
            Self::Sent => None,
        }
    }

    /// Whether `target` is reachable as a single legal transition.
    ///
    /// Staying in place is allowed (re-applying the same status is a no-op).
    pub fn can_advance_to(self, target: Self) -> bool {
        target == self || self.next() == Some(target)
    }
}

/// Filter used by status-based registry views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BatchStatus),
}

impl StatusFilter {
    pub fn matches(self, status: BatchStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == status,
        }
    }
}

impl From<BatchStatus> for StatusFilter {
    fn from(status: BatchStatus) -> Self {
        Self::Only(status)
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse::<BatchStatus>().map(Self::Only)
        }
    }
}

/// Server-reported counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchCounts {
    pub total_records: u64,
    pub valid_count: u64,
    pub duplicate_count: u64,
    pub filtered_count: u64,
}

/// A batch as cached by the local registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub file_name: String,
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Build the registry entry for a freshly uploaded file.
    ///
    /// Timestamps are left unset; the registry stamps them when the batch is
    /// added.
    pub fn uploaded(receipt: &UploadReceipt, product: &Product) -> Self {
        Self {
            id: receipt.batch_id.clone(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            file_name: receipt.file_name.clone(),
            status: BatchStatus::Uploaded,
            total_records: Some(receipt.total_records),
            valid_count: None,
            duplicate_count: None,
            filtered_count: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Counts as reported by the server, if the batch has been processed.
    pub fn counts(&self) -> Option<BatchCounts> {
        Some(BatchCounts {
            total_records: self.total_records?,
            valid_count: self.valid_count?,
            duplicate_count: self.duplicate_count?,
            filtered_count: self.filtered_count?,
        })
    }
}

/// Partial update applied through `BatchRegistry::update`.
///
/// Identity fields (`id`, product, file name, `created_at`) are deliberately
/// absent: they are immutable once the batch is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPatch {
    pub status: Option<BatchStatus>,
    pub total_records: Option<u64>,
    pub valid_count: Option<u64>,
    pub duplicate_count: Option<u64>,
    pub filtered_count: Option<u64>,
}

impl BatchPatch {
    pub fn status(status: BatchStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn counts(counts: BatchCounts) -> Self {
        Self {
            status: None,
            total_records: Some(counts.total_records),
            valid_count: Some(counts.valid_count),
            duplicate_count: Some(counts.duplicate_count),
            filtered_count: Some(counts.filtered_count),
        }
    }

    /// Patch recorded after a successful process call.
    pub fn processed(outcome: &ProcessOutcome) -> Self {
        Self::counts(outcome.counts()).with_status(BatchStatus::Processed)
    }

    /// Patch recorded when reconciling with a server summary.
    pub fn reconciled(summary: &BatchSummary) -> Self {
        Self::counts(summary.counts())
    }

    #[must_use]
    pub fn with_status(mut self, status: BatchStatus) -> Self {
        self.status = Some(status);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_advances_one_step() {
        assert!(BatchStatus::Uploaded.can_advance_to(BatchStatus::Processed));
        assert!(BatchStatus::Processed.can_advance_to(BatchStatus::Sent));
        assert!(BatchStatus::Sent.can_advance_to(BatchStatus::Sent));
        assert!(!BatchStatus::Uploaded.can_advance_to(BatchStatus::Sent));
        assert!(!BatchStatus::Sent.can_advance_to(BatchStatus::Processed));
        assert!(!BatchStatus::Processed.can_advance_to(BatchStatus::Uploaded));
    }

    #[test]
    fn status_order_matches_lifecycle() {
        assert!(BatchStatus::Uploaded < BatchStatus::Processed);
        assert!(BatchStatus::Processed < BatchStatus::Sent);
        assert_eq!(BatchStatus::Sent.next(), None);
    }

    #[test]
    fn status_filter_parses_all_and_statuses() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "Processed".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(BatchStatus::Processed)
        );
        assert!("archived".parse::<StatusFilter>().is_err());
        assert!(StatusFilter::All.matches(BatchStatus::Sent));
        assert!(!StatusFilter::Only(BatchStatus::Sent).matches(BatchStatus::Uploaded));
    }

    #[test]
    fn counts_require_every_field() {
        let mut batch = Batch {
            id: "B1".into(),
            product_id: "P1".into(),
            product_name: "Pos".into(),
            file_name: "leads.xlsx".into(),
            status: BatchStatus::Uploaded,
            total_records: Some(100),
            valid_count: None,
            duplicate_count: None,
            filtered_count: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(batch.counts(), None);

        batch.valid_count = Some(80);
        batch.duplicate_count = Some(15);
        batch.filtered_count = Some(5);
        assert_eq!(
            batch.counts(),
            Some(BatchCounts {
                total_records: 100,
                valid_count: 80,
                duplicate_count: 15,
                filtered_count: 5
            })
        );
    }

    #[test]
    fn persisted_form_uses_camel_case() {
        let json = r#"{"id":"B1","productId":"P1","status":"processed","validCount":12}"#;
        let batch: Batch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.status, BatchStatus::Processed);
        assert_eq!(batch.valid_count, Some(12));
        assert!(batch.created_at.is_none());
        assert!(batch.product_name.is_empty());
    }
}
