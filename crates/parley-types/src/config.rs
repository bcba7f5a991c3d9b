//! Client configuration types for Parley.
//!
//! `ClientConfig` represents the `config.toml` in the data directory that
//! controls the backend address and feed polling behavior.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Parley client.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Seconds between background feed refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// How many of the most recent messages each refresh requests.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_history_limit() -> u32 {
    50
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval_secs: default_refresh_interval_secs(),
            history_limit: default_history_limit(),
        }
    }
}
