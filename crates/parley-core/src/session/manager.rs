//! Session manager owning the observable session state.
//!
//! `SessionManager` hydrates the session from the persistent store once at
//! startup, runs login/register/logout against the backend, and publishes
//! every transition through a `tokio::sync::watch` channel so dependents
//! (feed synchronizer, route guard, screens) react without polling.

use parley_types::error::ApiError;
use parley_types::session::{ActiveSession, AuthGrant, Credentials, SessionState};
use parley_types::user::User;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::client::AuthClient;
use crate::session::store::SessionStore;

/// Owns the session state and the persistent store behind it.
///
/// Generic over `SessionStore` and `AuthClient` to maintain clean
/// architecture (parley-core never depends on parley-infra).
///
/// All mutations run under an internal lock, so concurrent calls cannot
/// interleave their state and store writes.
pub struct SessionManager<S: SessionStore, A: AuthClient> {
    store: S,
    auth: A,
    state: watch::Sender<SessionState>,
    mutate: Mutex<()>,
}

impl<S: SessionStore, A: AuthClient> SessionManager<S, A> {
    /// Create a manager in the `Uninitialized` state.
    pub fn new(store: S, auth: A) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        Self {
            store,
            auth,
            state,
            mutate: Mutex::new(()),
        }
    }

    /// Snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to session state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Hydrate the session from the persistent store.
    ///
    /// Runs exactly once; later calls are no-ops. A stored pair restores
    /// the session with a fresh epoch. Anything less than a complete,
    /// parseable pair (including store read failures) resolves to
    /// `Anonymous` -- hydration never fails, and the state always leaves
    /// `Uninitialized` when this returns.
    pub async fn initialize(&self) {
        let _guard = self.mutate.lock().await;
        if self.state.borrow().is_initialized() {
            debug!("Session already initialized");
            return;
        }

        let token = match self.store.load_token().await {
            Ok(token) => token,
            Err(error) => {
                warn!(error = %error, "Failed to read stored token, treating as absent");
                None
            }
        };
        let user = match self.store.load_user().await {
            Ok(user) => user,
            Err(error) => {
                warn!(error = %error, "Failed to read stored user, treating as absent");
                None
            }
        };

        let next = match (token, user) {
            (Some(token), Some(user)) => {
                info!(username = %user.username, "Session restored");
                SessionState::Authenticated(ActiveSession::new(token, user))
            }
            (None, None) => SessionState::Anonymous,
            _ => {
                // An incomplete pair never hydrates; clear it too.
                warn!("Stored session is incomplete, discarding");
                if let Err(error) = self.store.clear().await {
                    warn!(error = %error, "Failed to clear incomplete session");
                }
                SessionState::Anonymous
            }
        };
        self.state.send_replace(next);
    }

    /// Authenticate an existing account.
    ///
    /// On success the session becomes `Authenticated` and both slots are
    /// written through to the store. On failure the current state stands
    /// and the error is returned for display.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let _guard = self.mutate.lock().await;
        let grant = self.auth.login(credentials).await?;
        info!(username = %grant.user.username, "Logged in");
        Ok(self.establish(grant).await)
    }

    /// Create an account and authenticate in one step.
    pub async fn register(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let _guard = self.mutate.lock().await;
        let grant = self.auth.register(credentials).await?;
        info!(username = %grant.user.username, "Registered");
        Ok(self.establish(grant).await)
    }

    /// End the session.
    ///
    /// The remote logout is best-effort; the local state and store are
    /// cleared no matter what it returns. Also the path taken when any
    /// component sees the backend reject the token. A no-op without an
    /// authenticated session, so racing forced logouts collapse into one.
    pub async fn logout(&self) {
        let _guard = self.mutate.lock().await;
        if !self.state.borrow().is_authenticated() {
            return;
        }

        if let Err(error) = self.auth.logout().await {
            warn!(error = %error, "Remote logout failed, clearing local session anyway");
        }
        if let Err(error) = self.store.clear().await {
            warn!(error = %error, "Failed to clear stored session");
        }
        self.state.send_replace(SessionState::Anonymous);
        info!("Logged out");
    }

    /// Publish an authenticated session and write it through to the store.
    ///
    /// Store failures are contained: the in-memory session stands and the
    /// cost is re-login after a restart.
    async fn establish(&self, grant: AuthGrant) -> User {
        let active = ActiveSession::new(grant.token, grant.user);
        if let Err(error) = self.store.save(&active.token, &active.user).await {
            warn!(error = %error, "Failed to persist session");
        }
        let user = active.user.clone();
        self.state.send_replace(SessionState::Authenticated(active));
        user
    }
}
