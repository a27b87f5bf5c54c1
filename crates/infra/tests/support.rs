//! Shared helpers for `leadflow-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use leadflow_core::{BatchRegistry, PersistedStore};
use leadflow_domain::{Batch, Product, UploadReceipt};
use leadflow_infra::api::{ApiClient, ApiClientConfig, StaticTokenProvider};
use leadflow_infra::LeadApiClient;
use tempfile::TempDir;
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Lead client pointed at `server`, authenticating with [`TEST_TOKEN`].
pub fn lead_client(server: &MockServer) -> LeadApiClient {
    lead_client_at(&server.uri())
}

/// Lead client pointed at an arbitrary base URL.
pub fn lead_client_at(base_url: &str) -> LeadApiClient {
    let config = ApiClientConfig {
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        max_attempts: 3,
    };
    let client = ApiClient::new(config, Some(Arc::new(StaticTokenProvider::new(TEST_TOKEN))))
        .expect("api client should build");
    LeadApiClient::new(client)
}

/// Temporary directory that lives as long as the test holds it.
pub struct TestDir {
    pub dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self { dir: TempDir::new().expect("temp dir should be created") }
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.dir.path().join("leadflow.db")
    }

    pub fn store_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("store")
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry over `store`, already loaded.
pub fn loaded_registry(store: Arc<dyn PersistedStore>, max: usize) -> BatchRegistry {
    let mut registry = BatchRegistry::new(store, max);
    registry.load();
    registry
}

pub fn product(id: &str) -> Product {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("Product {id}"),
        "active": true,
        "enrolled_by_filter": {"values": ["6111 DIGITAL"], "mode": "whitelist"},
        "payment_status_filter": {"remove": ["PAGO"]},
        "consultant_ids": ["C1"]
    }))
    .expect("product fixture should deserialize")
}

pub fn uploaded(id: &str, product_id: &str) -> Batch {
    let receipt =
        UploadReceipt { batch_id: id.into(), file_name: format!("{id}.xlsx"), total_records: 40 };
    Batch::uploaded(&receipt, &product(product_id))
}
