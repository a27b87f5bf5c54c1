//! Application constants
//!
//! Centralized location for domain-level constants shared by the registry,
//! the workflow and the adapters.

// Batch registry
pub const DEFAULT_MAX_BATCHES: usize = 20;
pub const BATCH_STORE_KEY: &str = "leadflow_batches";
pub const BATCH_STORE_FORMAT_VERSION: u32 = 1;

// Upload validation (extensions compared case-insensitively, without the dot)
pub const ALLOWED_UPLOAD_EXTENSIONS: [&str; 3] = ["xls", "xlsx", "html"];

// Remote paging
pub const DEFAULT_LEADS_PAGE_SIZE: u64 = 100;
pub const DEFAULT_HISTORY_PAGE_SIZE: u64 = 100;

// Remote API
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_MAX_ATTEMPTS: usize = 3;
