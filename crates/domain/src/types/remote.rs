//! Results of the remote batch operations

use serde::{Deserialize, Serialize};

use super::batch::{BatchCounts, BatchStatus};
use crate::constants::ALLOWED_UPLOAD_EXTENSIONS;

/// A spreadsheet selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Whether the file is a spreadsheet or HTML export the server accepts.
    pub fn has_allowed_extension(&self) -> bool {
        self.extension().is_some_and(|ext| ALLOWED_UPLOAD_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Response of the upload operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub batch_id: String,
    pub file_name: String,
    pub total_records: u64,
}

/// Response of the process (dedup + filter) operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub total_processed: u64,
    pub valid_count: u64,
    pub duplicate_count: u64,
    pub filtered_count: u64,
    #[serde(default)]
    pub filter_details: serde_json::Value,
}

impl ProcessOutcome {
    pub fn counts(&self) -> BatchCounts {
        BatchCounts {
            total_records: self.total_processed,
            valid_count: self.valid_count,
            duplicate_count: self.duplicate_count,
            filtered_count: self.filtered_count,
        }
    }
}

/// Response of the CRM dispatch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DispatchOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_id: Option<String>,
    pub total: u64,
    pub sent_success_count: u64,
    pub sent_error_count: u64,
    #[serde(default)]
    pub consultants_used: Vec<String>,
}

/// Authoritative per-batch counts from the summary endpoint.
///
/// `valid_count` covers every lead that passed processing, whether it is
/// still waiting for dispatch, already sent, or failed in the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub product_name: String,
    pub total_records: u64,
    pub valid_count: u64,
    pub duplicate_count: u64,
    pub filtered_count: u64,
    pub pending: u64,
    pub awaiting_dispatch: u64,
    pub sent: u64,
    pub errors: u64,
}

impl BatchSummary {
    pub fn counts(&self) -> BatchCounts {
        BatchCounts {
            total_records: self.total_records,
            valid_count: self.valid_count,
            duplicate_count: self.duplicate_count,
            filtered_count: self.filtered_count,
        }
    }

    /// The furthest lifecycle stage the per-lead counts prove was reached.
    ///
    /// `None` when the batch has no leads at all.
    pub fn implied_status(&self) -> Option<BatchStatus> {
        if self.total_records == 0 {
            return None;
        }
        if self.pending > 0 {
            return Some(BatchStatus::Uploaded);
        }
        if self.awaiting_dispatch == 0 && self.sent + self.errors > 0 {
            return Some(BatchStatus::Sent);
        }
        Some(BatchStatus::Processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> BatchSummary {
        BatchSummary {
            batch_id: "B1".into(),
            product_name: "Pos".into(),
            total_records: 100,
            valid_count: 80,
            duplicate_count: 15,
            filtered_count: 5,
            pending: 0,
            awaiting_dispatch: 80,
            sent: 0,
            errors: 0,
        }
    }

    #[test]
    fn allowed_extensions_are_case_insensitive() {
        assert!(UploadFile::new("leads.xlsx", vec![]).has_allowed_extension());
        assert!(UploadFile::new("LEADS.XLS", vec![]).has_allowed_extension());
        assert!(UploadFile::new("export.html", vec![]).has_allowed_extension());
        assert!(!UploadFile::new("leads.csv", vec![]).has_allowed_extension());
        assert!(!UploadFile::new("xlsx", vec![]).has_allowed_extension());
        assert!(!UploadFile::new(".xlsx", vec![]).has_allowed_extension());
    }

    #[test]
    fn debug_hides_file_contents() {
        let file = UploadFile::new("leads.xls", vec![1, 2, 3]);
        let rendered = format!("{file:?}");
        assert!(rendered.contains("size: 3"));
        assert!(!rendered.contains("[1, 2, 3]"));
    }

    #[test]
    fn implied_status_follows_lead_counts() {
        let mut s = summary();
        assert_eq!(s.implied_status(), Some(BatchStatus::Processed));

        s.pending = 100;
        assert_eq!(s.implied_status(), Some(BatchStatus::Uploaded));

        s.pending = 0;
        s.awaiting_dispatch = 0;
        s.sent = 78;
        s.errors = 2;
        assert_eq!(s.implied_status(), Some(BatchStatus::Sent));
    }

    #[test]
    fn fully_filtered_batch_is_processed_not_sent() {
        let mut s = summary();
        s.valid_count = 0;
        s.awaiting_dispatch = 0;
        s.duplicate_count = 60;
        s.filtered_count = 40;
        assert_eq!(s.implied_status(), Some(BatchStatus::Processed));
    }

    #[test]
    fn empty_batch_implies_nothing() {
        let mut s = summary();
        s.total_records = 0;
        assert_eq!(s.implied_status(), None);
    }
}
