//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `OPENCIRCLE_API_BASE_URL`: Backend API base URL (required)
//! - `OPENCIRCLE_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `OPENCIRCLE_API_MAX_ATTEMPTS`: Attempts per request
//! - `OPENCIRCLE_SESSION_CHECK_INTERVAL_SECS`: Periodic check cadence;
//!   zero disables the timer
//! - `OPENCIRCLE_SESSION_CHECK_ENABLED`: Whether the check runs (true/false)
//! - `OPENCIRCLE_SESSION_SETTLE_DELAY_MS`: Post-login settle delay
//! - `OPENCIRCLE_SESSION_FILE`: Path of the persisted session snapshot
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./opencircle.json` or `./opencircle.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use opencircle_domain::{ClientConfig, OpenCircleError, Result, SessionConfig, StorageConfig};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `OpenCircleError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `OPENCIRCLE_API_BASE_URL` is required; everything else falls back to
/// its default.
///
/// # Errors
/// Returns `OpenCircleError::Config` if the base URL is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let base_url = env_var("OPENCIRCLE_API_BASE_URL")?;

    let mut config = ClientConfig::default();
    config.api.base_url = base_url;

    if let Some(timeout) = env_parse::<u64>("OPENCIRCLE_API_TIMEOUT_SECS")? {
        config.api.timeout_seconds = timeout;
    }
    if let Some(attempts) = env_parse::<usize>("OPENCIRCLE_API_MAX_ATTEMPTS")? {
        config.api.max_attempts = attempts;
    }

    let session_defaults = SessionConfig::default();
    config.session = SessionConfig {
        check_interval_seconds: env_parse::<u64>("OPENCIRCLE_SESSION_CHECK_INTERVAL_SECS")?
            .unwrap_or(session_defaults.check_interval_seconds),
        check_enabled: env_bool(
            "OPENCIRCLE_SESSION_CHECK_ENABLED",
            session_defaults.check_enabled,
        ),
        settle_delay_ms: env_parse::<u64>("OPENCIRCLE_SESSION_SETTLE_DELAY_MS")?
            .unwrap_or(session_defaults.settle_delay_ms),
    };

    if let Ok(session_file) = std::env::var("OPENCIRCLE_SESSION_FILE") {
        config.storage = StorageConfig { session_file };
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `OpenCircleError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(OpenCircleError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            OpenCircleError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| OpenCircleError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| OpenCircleError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| OpenCircleError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(OpenCircleError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("opencircle.json"),
            cwd.join("opencircle.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("opencircle.json"),
                exe_dir.join("opencircle.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        OpenCircleError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional environment variable
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| OpenCircleError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
