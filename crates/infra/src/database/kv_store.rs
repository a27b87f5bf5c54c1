//! SQLite-backed `PersistedStore`

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use leadflow_core::PersistedStore;
use leadflow_domain::Result;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use super::manager::{map_sql_error, DbManager};

/// Key/value blobs in the `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<DbManager>,
}

impl SqliteStore {
    /// Wrap an already migrated database.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Open the database at `path` and run migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = DbManager::new(path)?;
        db.run_migrations()?;
        Ok(Self::new(Arc::new(db)))
    }
}

impl PersistedStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.connection();
        conn.query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()
            .map_err(map_sql_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )
        .map_err(map_sql_error)?;
        debug!(key, bytes = value.len(), "kv entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key]).map_err(map_sql_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let db = DbManager::open_in_memory().unwrap();
        db.run_migrations().unwrap();
        SqliteStore::new(Arc::new(db))
    }

    #[test]
    fn missing_key_reads_as_none() {
        assert_eq!(store().get("absent").unwrap(), None);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = store();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn removing_missing_key_is_not_an_error() {
        let store = store();
        store.remove("never-written").unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn unmigrated_database_surfaces_storage_error() {
        let store = SqliteStore::new(Arc::new(DbManager::open_in_memory().unwrap()));
        assert!(matches!(store.get("k"), Err(leadflow_domain::LeadFlowError::Storage(_))));
    }
}
