//! Application context - dependency injection container

use std::sync::Arc;

use leadflow_core::{
    BatchRegistry, InMemoryStore, LeadApi, PersistedStore, RemoteBatchView, SharedRegistry,
    UploadOrchestrator,
};
use leadflow_domain::{Config, Result, StorageBackend, StorageConfig};
use leadflow_infra::{FileStore, LeadApiClient, SqliteStore};
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn LeadApi>,
    pub registry: SharedRegistry,
    pub orchestrator: UploadOrchestrator,
    pub remote: RemoteBatchView,
    /// False when the configured store could not be opened and batches only
    /// live for this process.
    pub durable: bool,
}

impl AppContext {
    /// Wire the production adapters described by `config`.
    ///
    /// A store that cannot be opened is replaced by an in-memory one so the
    /// workflow stays usable.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api: Arc<dyn LeadApi> = Arc::new(LeadApiClient::from_config(&config.api)?);

        let (store, durable) = match open_store(&config.storage) {
            Ok(store) => (store, config.storage.backend != StorageBackend::Memory),
            Err(err) => {
                warn!(
                    backend = %config.storage.backend,
                    path = %config.storage.path,
                    error = %err,
                    "Batch store unavailable, keeping batches in memory"
                );
                (Arc::new(InMemoryStore::new()) as Arc<dyn PersistedStore>, false)
            }
        };

        let mut ctx = Self::with_parts(config, api, store);
        ctx.durable = durable;
        Ok(ctx)
    }

    /// Assemble a context from already constructed adapters.
    pub fn with_parts(
        config: Config,
        api: Arc<dyn LeadApi>,
        store: Arc<dyn PersistedStore>,
    ) -> Self {
        let mut registry = BatchRegistry::new(store, config.storage.max_batches);
        registry.load();
        let registry = registry.into_shared();

        let orchestrator = UploadOrchestrator::new(Arc::clone(&api), Arc::clone(&registry));
        let remote = RemoteBatchView::new(Arc::clone(&api), Arc::clone(&registry));

        info!(
            base_url = %config.api.base_url,
            max_batches = config.storage.max_batches,
            "Application context initialised"
        );

        Self { config, api, registry, orchestrator, remote, durable: true }
    }
}

fn open_store(storage: &StorageConfig) -> Result<Arc<dyn PersistedStore>> {
    let store: Arc<dyn PersistedStore> = match storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&storage.path)?),
        StorageBackend::File => Arc::new(FileStore::open(&storage.path)?),
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
    };
    Ok(store)
}
