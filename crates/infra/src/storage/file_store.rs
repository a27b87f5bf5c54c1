//! Directory-backed `PersistedStore`
//!
//! Each key is one `<key>.json` file. Writes go to a temporary file in the
//! same directory which is then renamed over the target, so a crash leaves
//! either the old blob or the new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use leadflow_core::PersistedStore;
use leadflow_domain::{LeadFlowError, Result};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::InfraError;

/// One JSON file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the store root, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(io_error)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(LeadFlowError::Storage(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl PersistedStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            // Undecodable bytes are handed to the caller as-is; the registry
            // treats them as a corrupt blob and overwrites them on next save.
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(io_error)?;
        temp.write_all(value.as_bytes()).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&path).map_err(|e| io_error(e.error))?;

        debug!(key, path = %path.display(), bytes = value.len(), "store file written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(err)),
        }
    }
}

fn io_error(err: std::io::Error) -> LeadFlowError {
    LeadFlowError::from(InfraError::from(err))
}
