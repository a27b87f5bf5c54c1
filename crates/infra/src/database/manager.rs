//! Database connection manager for the local SQLite file.

use std::path::{Path, PathBuf};

use leadflow_domain::{LeadFlowError, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OpenFlags};
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");
const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Database manager that owns a single SQLite connection.
///
/// The registry writes a handful of small blobs, so one serialized
/// connection is enough.
pub struct DbManager {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database file at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                LeadFlowError::Storage(format!(
                    "unable to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(map_sql_error)?;
        configure(&conn)?;

        info!(db_path = %path.display(), "sqlite database opened");

        Ok(Self { conn: Mutex::new(conn), path })
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_sql_error)?;
        configure(&conn)?;
        Ok(Self { conn: Mutex::new(conn), path: PathBuf::from(":memory:") })
    }

    /// Lock the connection for the duration of the returned guard.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.connection();
        create_schema(&conn)
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))
        .map_err(map_sql_error)?;
    Ok(())
}

fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_sql_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> LeadFlowError {
    LeadFlowError::from(InfraError::from(err))
}
