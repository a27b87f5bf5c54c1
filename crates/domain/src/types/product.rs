//! Product catalogue types
//!
//! A product decides which filter rules and which consultants apply to the
//! leads of a batch. Rules are evaluated server-side; the client only needs
//! to know whether a product is configured well enough to accept uploads.

use serde::{Deserialize, Serialize};

/// Whether the enrolled-by list admits or excludes matching leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Whitelist,
    Blacklist,
}

crate::impl_domain_status_conversions!(FilterMode {
    Whitelist => "whitelist",
    Blacklist => "blacklist",
});

/// Rule on the "enrolled by" column of the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnrolledByFilter {
    pub values: Vec<String>,
    pub mode: FilterMode,
}

/// Payment statuses whose leads are dropped during processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentStatusFilter {
    pub remove: Vec<String>,
}

/// A product as exposed by the catalogue endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub enrolled_by_filter: EnrolledByFilter,
    #[serde(default)]
    pub payment_status_filter: PaymentStatusFilter,
    #[serde(default)]
    pub consultant_ids: Vec<String>,
}

impl Product {
    /// A product can receive uploads once it has consultants to dispatch to
    /// and at least one filter list.
    pub fn has_rules(&self) -> bool {
        let has_filters = !self.enrolled_by_filter.values.is_empty()
            || !self.payment_status_filter.remove.is_empty();
        !self.consultant_ids.is_empty() && has_filters
    }
}
