//! Backend client trait definitions (ports).
//!
//! These traits define the REST surface the engine talks to. Uses RPITIT
//! (native async fn in traits, Rust 2024 edition). Implementations live in
//! parley-infra; tests substitute in-memory fakes.

use parley_types::error::ApiError;
use parley_types::message::{Message, SendReceipt};
use parley_types::session::{AuthGrant, Credentials};
use parley_types::user::Profile;

/// Account registration, login, and logout.
///
/// Login and register return the token together with the account it
/// authenticates; the engine never sees one without the other.
pub trait AuthClient: Send + Sync {
    /// Create an account and authenticate in one step.
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<AuthGrant, ApiError>> + Send;

    /// Authenticate an existing account.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<AuthGrant, ApiError>> + Send;

    /// Invalidate the current token on the backend.
    ///
    /// Callers treat failures as best-effort: the local session is cleared
    /// regardless of the outcome.
    fn logout(&self) -> impl std::future::Future<Output = Result<(), ApiError>> + Send;
}

/// The shared-room message feed.
pub trait ChatClient: Send + Sync {
    /// Fetch the latest window of messages, at most `limit` entries,
    /// ordered as the backend serves them.
    fn list_messages(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, ApiError>> + Send;

    /// Post a message. The receipt says whether the backend echoed the
    /// created record or merely accepted the write.
    fn send_message(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<SendReceipt, ApiError>> + Send;
}

/// The account profile endpoint.
pub trait ProfileClient: Send + Sync {
    fn get_profile(&self)
    -> impl std::future::Future<Output = Result<Profile, ApiError>> + Send;
}
