//! Application state wiring the engine to its concrete collaborators.
//!
//! The engine types are generic over store/client traits; AppState pins
//! them to the file store and reqwest clients from parley-infra and
//! hydrates the session once at startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parley_core::chat::synchronizer::ChatSynchronizer;
use parley_core::session::manager::SessionManager;
use parley_infra::config::load_client_config;
use parley_infra::http::ApiClient;
use parley_infra::http::auth::HttpAuthClient;
use parley_infra::http::chat::HttpChatClient;
use parley_infra::http::profile::HttpProfileClient;
use parley_infra::store::{FileSessionStore, resolve_data_dir};
use parley_types::config::ClientConfig;

/// Concrete type aliases for the engine generics pinned to infra implementations.
pub type ConcreteSessionManager =
    SessionManager<FileSessionStore, HttpAuthClient<FileSessionStore>>;

pub type ConcreteChatSynchronizer = ChatSynchronizer<
    HttpChatClient<FileSessionStore>,
    FileSessionStore,
    HttpAuthClient<FileSessionStore>,
>;

/// Shared application state used by every command.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ConcreteSessionManager>,
    pub sync: Arc<ConcreteChatSynchronizer>,
    pub profile: HttpProfileClient<FileSessionStore>,
    pub config: ClientConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, load config,
    /// wire the clients, hydrate the session from the store.
    pub async fn init(base_url_override: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_client_config(&data_dir).await;
        if let Some(base_url) = base_url_override {
            config.base_url = base_url;
        }

        let store = FileSessionStore::new(&data_dir);
        let api = ApiClient::new(&config.base_url, store.clone());

        let session = Arc::new(SessionManager::new(
            store,
            HttpAuthClient::new(api.clone()),
        ));
        session.initialize().await;

        let sync = Arc::new(ChatSynchronizer::new(
            HttpChatClient::new(api.clone()),
            Arc::clone(&session),
            Duration::from_secs(config.refresh_interval_secs),
            config.history_limit,
        ));

        Ok(Self {
            session,
            sync,
            profile: HttpProfileClient::new(api),
            config,
            data_dir,
        })
    }
}
