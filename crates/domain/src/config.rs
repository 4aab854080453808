//! Client configuration structures
//!
//! Deserialized from environment variables or a config file by the infra
//! loader.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_MAX_ATTEMPTS, DEFAULT_API_TIMEOUT_SECS, DEFAULT_LOGIN_SETTLE_DELAY_MS,
    DEFAULT_SESSION_CHECK_INTERVAL_SECS,
};

/// Top-level configuration for the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the OpenCircle REST API
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,
    /// Total attempts per request (initial try + retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opencircle.app".to_string(),
            timeout_seconds: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_API_MAX_ATTEMPTS,
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Periodic re-validation cadence in seconds; zero disables the check
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_seconds: u64,
    /// Whether the periodic check runs at all
    #[serde(default = "default_check_enabled")]
    pub check_enabled: bool,
    /// Delay after a committed login before navigation, in milliseconds.
    /// Session cookies need a beat to propagate before the next
    /// authenticated request fires.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: DEFAULT_SESSION_CHECK_INTERVAL_SECS,
            check_enabled: true,
            settle_delay_ms: DEFAULT_LOGIN_SETTLE_DELAY_MS,
        }
    }
}

/// Persisted session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the persisted session snapshot file
    pub session_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { session_file: "opencircle-session.json".to_string() }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_max_attempts() -> usize {
    DEFAULT_API_MAX_ATTEMPTS
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_SESSION_CHECK_INTERVAL_SECS
}

fn default_check_enabled() -> bool {
    true
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_LOGIN_SETTLE_DELAY_MS
}
