//! File-backed session store.
//!
//! Persists the session as two files under `{data_dir}/session/`: `token`
//! holds the raw token text, `user.json` the serialized account. The pair
//! is only ever written and removed together, mirroring the
//! both-or-neither shape of the session itself.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parley_core::session::store::SessionStore;
use parley_types::error::StoreError;
use parley_types::user::User;
use tracing::debug;

/// Filesystem implementation of `SessionStore`.
///
/// A cheap handle over the session directory; clones share nothing but
/// the path. All operations go through `tokio::fs` for async I/O.
#[derive(Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at `{data_dir}/session/`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("session"),
        }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join("token")
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join("user.json")
    }
}

impl SessionStore for FileSessionStore {
    async fn load_token(&self) -> Result<Option<String>, StoreError> {
        match tokio::fs::read_to_string(self.token_path()).await {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err.to_string())),
        }
    }

    async fn load_user(&self) -> Result<Option<User>, StoreError> {
        let raw = match tokio::fs::read_to_string(self.user_path()).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StoreError::Corrupt(format!("user.json: {err}")))
    }

    async fn save(&self, token: &str, user: &User) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let user_json = serde_json::to_string_pretty(user)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        tokio::fs::write(self.token_path(), token)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?;
        tokio::fs::write(self.user_path(), user_json)
            .await
            .map_err(|err| StoreError::Io(err.to_string()))?;
        debug!("Session written to {}", self.dir.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        remove_if_present(self.token_path()).await?;
        remove_if_present(self.user_path()).await?;
        Ok(())
    }
}

async fn remove_if_present(path: PathBuf) -> Result<(), StoreError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StoreError::Io(err.to_string())),
    }
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. Platform home directory (`~/.parley`)
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_store_has_no_session() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        assert_eq!(store.load_token().await.unwrap(), None);
        assert!(store.load_user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_both_slots() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        store.save("tok123", &user()).await.unwrap();

        assert_eq!(store.load_token().await.unwrap().as_deref(), Some("tok123"));
        let loaded = store.load_user().await.unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.id, 1);
    }

    #[tokio::test]
    async fn save_survives_process_boundaries() {
        let dir = tempdir().unwrap();
        {
            let store = FileSessionStore::new(dir.path());
            store.save("tok456", &user()).await.unwrap();
        }

        // A fresh handle over the same directory sees the session.
        let store = FileSessionStore::new(dir.path());
        assert_eq!(store.load_token().await.unwrap().as_deref(), Some("tok456"));
    }

    #[tokio::test]
    async fn clear_removes_both_slots_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save("tok123", &user()).await.unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.load_token().await.unwrap(), None);
        assert!(store.load_user().await.unwrap().is_none());

        // Clearing an already-empty store is fine.
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_user_file_reports_corruption() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save("tok123", &user()).await.unwrap();
        tokio::fs::write(store.user_path(), "not json at all")
            .await
            .unwrap();

        let err = store.load_user().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        // The token slot is unaffected.
        assert_eq!(store.load_token().await.unwrap().as_deref(), Some("tok123"));
    }

    #[tokio::test]
    async fn blank_token_file_counts_as_absent() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        tokio::fs::create_dir_all(dir.path().join("session"))
            .await
            .unwrap();
        tokio::fs::write(store.token_path(), "  \n").await.unwrap();

        assert_eq!(store.load_token().await.unwrap(), None);
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var("PARLEY_DATA_DIR", "/tmp/test-parley");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-parley"));
        unsafe {
            std::env::remove_var("PARLEY_DATA_DIR");
        }
    }
}
