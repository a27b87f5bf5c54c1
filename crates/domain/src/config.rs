//! Configuration structures

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_MAX_ATTEMPTS, DEFAULT_API_TIMEOUT_SECS, DEFAULT_MAX_BATCHES,
};
use crate::errors::{LeadFlowError, Result};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(LeadFlowError::Config("api.base_url must not be empty".into()));
        }
        if self.storage.max_batches == 0 {
            return Err(LeadFlowError::Config("storage.max_batches must be at least 1".into()));
        }
        if self.api.max_attempts == 0 {
            return Err(LeadFlowError::Config("api.max_attempts must be at least 1".into()));
        }
        if self.storage.backend != StorageBackend::Memory && self.storage.path.trim().is_empty() {
            return Err(LeadFlowError::Config(format!(
                "storage.path is required for the {} backend",
                self.storage.backend
            )));
        }
        Ok(())
    }
}

/// Remote lead API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Pre-issued bearer token. Takes precedence over email/password login.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_API_MAX_ATTEMPTS,
            token: None,
            email: None,
            password: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_max_attempts() -> usize {
    DEFAULT_API_MAX_ATTEMPTS
}

/// Which durable surface backs the batch registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
    Memory,
}

crate::impl_domain_status_conversions!(StorageBackend {
    Sqlite => "sqlite",
    File => "file",
    Memory => "memory",
});

/// Local persistence configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite database file, or directory for the file backend
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default = "default_max_batches")]
    pub max_batches: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: default_storage_path(),
            max_batches: DEFAULT_MAX_BATCHES,
        }
    }
}

fn default_storage_path() -> String {
    "leadflow.db".to_string()
}

fn default_max_batches() -> usize {
    DEFAULT_MAX_BATCHES
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
