//! Individual lead rows and paged listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HISTORY_PAGE_SIZE, DEFAULT_LEADS_PAGE_SIZE};

/// Per-lead status as tracked by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Pending,
    Processed,
    Sent,
    Error,
    Duplicate,
    Filtered,
}

crate::impl_domain_status_conversions!(LeadStatus {
    Pending => "pending",
    Processed => "processed",
    Sent => "sent",
    Error => "error",
    Duplicate => "duplicate",
    Filtered => "filtered",
});

/// One lead of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub candidate_id: String,
    pub name: String,
    pub phone: String,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crm_lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_error: Option<String>,
}

/// Paging and filter parameters for a lead listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadQuery {
    pub status: Option<LeadStatus>,
    pub skip: u64,
    pub limit: u64,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self { status: None, skip: 0, limit: DEFAULT_LEADS_PAGE_SIZE }
    }
}

impl LeadQuery {
    pub fn with_status(status: LeadStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }
}

/// A page of leads. `total` is the server's count for the same filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    pub total: u64,
}

impl LeadPage {
    pub fn returned(&self) -> u64 {
        self.leads.len() as u64
    }

    /// Whether fewer rows came back than the best known total.
    pub fn is_truncated(&self, known_total: Option<u64>) -> bool {
        self.returned() < self.expected_total(known_total)
    }

    /// "showing N of M" when the page does not cover every lead.
    pub fn coverage_hint(&self, known_total: Option<u64>) -> Option<String> {
        if self.is_truncated(known_total) {
            Some(format!("showing {} of {}", self.returned(), self.expected_total(known_total)))
        } else {
            None
        }
    }

    fn expected_total(&self, known_total: Option<u64>) -> u64 {
        known_total.map_or(self.total, |known| known.max(self.total))
    }
}

/// Candidate already dispatched to the CRM (server-side dedup history).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub candidate_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Paging parameters for the dispatch history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    pub skip: u64,
    pub limit: u64,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self { skip: 0, limit: DEFAULT_HISTORY_PAGE_SIZE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(id: &str) -> Lead {
        Lead {
            id: id.into(),
            candidate_id: format!("cand-{id}"),
            name: "Maria".into(),
            phone: "44999990000".into(),
            status: LeadStatus::Processed,
            cpf: None,
            course: None,
            campus: None,
            enrolled_by: None,
            payment_status: None,
            filter_reason: None,
            crm_lead_id: None,
            consultant_id: None,
            sent_at: None,
            send_error: None,
        }
    }

    #[test]
    fn full_page_has_no_hint() {
        let page = LeadPage { leads: vec![lead("1"), lead("2")], total: 2 };
        assert!(!page.is_truncated(None));
        assert_eq!(page.coverage_hint(Some(2)), None);
    }

    #[test]
    fn truncated_page_reports_coverage() {
        let page = LeadPage { leads: vec![lead("1")], total: 250 };
        assert_eq!(page.coverage_hint(None).as_deref(), Some("showing 1 of 250"));
    }

    #[test]
    fn known_batch_total_wins_when_larger() {
        let page = LeadPage { leads: vec![lead("1"), lead("2")], total: 2 };
        assert_eq!(page.coverage_hint(Some(80)).as_deref(), Some("showing 2 of 80"));
    }

    #[test]
    fn lead_status_round_trips_through_strings() {
        assert_eq!("duplicate".parse::<LeadStatus>().unwrap(), LeadStatus::Duplicate);
        assert_eq!(LeadStatus::Filtered.to_string(), "filtered");
        assert!("ignored".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn default_query_uses_page_size() {
        let query = LeadQuery::default();
        assert_eq!(query.limit, 100);
        assert_eq!(query.skip, 0);
        assert_eq!(LeadQuery::with_status(LeadStatus::Sent).status, Some(LeadStatus::Sent));
    }
}
