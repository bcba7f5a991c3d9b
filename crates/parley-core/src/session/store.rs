//! Persistent session store trait.
//!
//! Defines the interface for the on-disk session slots (token and user).
//! Implementations live in parley-infra.

use parley_types::error::StoreError;
use parley_types::user::User;

/// Trait for the persistent session slots.
///
/// The two slots are written and cleared only as a pair: `save` and
/// `clear` cover both, and no operation exists to touch one alone. Reads
/// stay separate because the request layer only ever needs the token.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SessionStore: Send + Sync {
    /// Read the stored token. `None` if absent.
    fn load_token(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Read the stored user. `None` if absent.
    fn load_user(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Write both slots.
    fn save(
        &self,
        token: &str,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Remove both slots. Absent slots are not an error.
    fn clear(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
