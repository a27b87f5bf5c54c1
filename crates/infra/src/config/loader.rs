//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If `LEADFLOW_API_URL` is set, the environment alone describes the
//!    configuration (unset variables keep their defaults)
//! 2. Otherwise a config file is probed; without one the defaults apply
//! 3. Environment variables that are set always override file values, so
//!    secrets never have to live in a file
//! 4. The result is validated before it is returned
//!
//! ## Environment Variables
//! - `LEADFLOW_API_URL`: Lead server base URL
//! - `LEADFLOW_API_TIMEOUT`: Per-request timeout in seconds
//! - `LEADFLOW_API_TOKEN`: Pre-issued bearer token
//! - `LEADFLOW_API_EMAIL` / `LEADFLOW_API_PASSWORD`: Login credentials
//! - `LEADFLOW_STORAGE_BACKEND`: `sqlite`, `file` or `memory`
//! - `LEADFLOW_STORAGE_PATH`: Database file or store directory
//! - `LEADFLOW_MAX_BATCHES`: Registry capacity (at least 1)
//! - `LEADFLOW_LOG`: Log filter (e.g. `info`, `leadflow_core=debug`)
//! - `LEADFLOW_LOG_JSON`: Emit JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes `leadflow.{json,toml}` then `config.{json,toml}` in the
//! current directory, its two parents, and next to the executable.

use std::path::{Path, PathBuf};

use leadflow_domain::{Config, LeadFlowError, Result, StorageBackend};

const CONFIG_FILE_NAMES: [&str; 4] = ["leadflow.json", "leadflow.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LeadFlowError::Config` if a probed file is malformed, an
/// environment variable has an invalid value, or validation fails.
pub fn load() -> Result<Config> {
    let mut config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Environment incomplete, trying config file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::info!("No config file found, using defaults");
                    Config::default()
                }
            }
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `LEADFLOW_API_URL` is required; every other variable is optional.
///
/// # Errors
/// Returns `LeadFlowError::Config` if the URL is missing or a variable has
/// an invalid value.
pub fn load_from_env() -> Result<Config> {
    env_var("LEADFLOW_API_URL")?;

    let mut config = Config::default();
    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

/// Overlay every `LEADFLOW_*` variable that is set onto `config`.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(url) = env_opt("LEADFLOW_API_URL") {
        config.api.base_url = url;
    }
    if let Some(timeout) = env_parse::<u64>("LEADFLOW_API_TIMEOUT")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(token) = env_opt("LEADFLOW_API_TOKEN") {
        config.api.token = Some(token);
    }
    if let Some(email) = env_opt("LEADFLOW_API_EMAIL") {
        config.api.email = Some(email);
    }
    if let Some(password) = env_opt("LEADFLOW_API_PASSWORD") {
        config.api.password = Some(password);
    }
    if let Some(backend) = env_opt("LEADFLOW_STORAGE_BACKEND") {
        config.storage.backend = backend.parse::<StorageBackend>().map_err(|e| {
            LeadFlowError::Config(format!("Invalid LEADFLOW_STORAGE_BACKEND: {e}"))
        })?;
    }
    if let Some(path) = env_opt("LEADFLOW_STORAGE_PATH") {
        config.storage.path = path;
    }
    if let Some(max) = env_parse::<usize>("LEADFLOW_MAX_BATCHES")? {
        config.storage.max_batches = max;
    }
    if let Some(level) = env_opt("LEADFLOW_LOG") {
        config.logging.level = level;
    }
    if let Some(json) = env_opt("LEADFLOW_LOG_JSON") {
        config.logging.json = parse_bool(&json);
    }
    Ok(())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension).
///
/// # Errors
/// Returns `LeadFlowError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LeadFlowError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LeadFlowError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LeadFlowError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format follows the extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LeadFlowError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LeadFlowError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(LeadFlowError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    probe_in(&dirs)
}

fn probe_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        LeadFlowError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-blank value of `key`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| LeadFlowError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}

/// Accepts: `1`, `true`, `yes`, `on` (case-insensitive); anything else is false
fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
