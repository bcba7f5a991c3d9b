//! Client configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in
//! production) and deserializes it into [`ClientConfig`]. Falls back to
//! sensible defaults when the file is missing or malformed.

use std::path::Path;

use parley_types::config::ClientConfig;

/// Minimum seconds between feed refreshes (safety floor).
const MIN_REFRESH_INTERVAL_SECS: u64 = 1;

/// Minimum message window per refresh (safety floor).
///
/// The backend treats a non-positive limit as "no limit", so a zero here
/// would fetch the entire room history on every tick.
const MIN_HISTORY_LIMIT: u32 = 1;

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config
///   with the polling floors applied.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => enforce_floors(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Clamp user-supplied polling values to their floors.
///
/// The feed engine requires a non-zero refresh period.
fn enforce_floors(mut config: ClientConfig) -> ClientConfig {
    if config.refresh_interval_secs < MIN_REFRESH_INTERVAL_SECS {
        tracing::warn!(
            "refresh_interval_secs = {} is below the minimum, using {}",
            config.refresh_interval_secs,
            MIN_REFRESH_INTERVAL_SECS
        );
        config.refresh_interval_secs = MIN_REFRESH_INTERVAL_SECS;
    }
    if config.history_limit < MIN_HISTORY_LIMIT {
        tracing::warn!(
            "history_limit = {} is below the minimum, using {}",
            config.history_limit,
            MIN_HISTORY_LIMIT
        );
        config.history_limit = MIN_HISTORY_LIMIT;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_client_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.refresh_interval_secs, 5);
        assert_eq!(config.history_limit, 50);
    }

    #[tokio::test]
    async fn load_client_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
base_url = "https://chat.example.com"
refresh_interval_secs = 2
"#,
        )
        .await
        .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.refresh_interval_secs, 2);
        assert_eq!(config.history_limit, 50);
    }

    #[tokio::test]
    async fn load_client_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[tokio::test]
    async fn load_client_config_floors_zero_refresh_interval() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "refresh_interval_secs = 0")
            .await
            .unwrap();

        let config = load_client_config(tmp.path()).await;
        // A zero period would stall the feed engine before its first fetch.
        assert_eq!(config.refresh_interval_secs, MIN_REFRESH_INTERVAL_SECS);
    }

    #[tokio::test]
    async fn load_client_config_floors_zero_history_limit() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "history_limit = 0")
            .await
            .unwrap();

        let config = load_client_config(tmp.path()).await;
        assert_eq!(config.history_limit, MIN_HISTORY_LIMIT);
    }
}
