//! User and profile types for Parley.
//!
//! A `User` is the account identity cached alongside the auth token for the
//! lifetime of a session. The `Profile` is the richer view served by the
//! profile endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated account as returned by the auth endpoints.
///
/// Immutable within a session. Replaced wholesale on login/register,
/// never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Account details served by the profile endpoint.
///
/// Shape matches `User` today; kept separate because the backend may grow
/// profile-only fields that never belong in the persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Fallback view of a cached session user, for when the profile
    /// endpoint is unreachable but the session is still locally valid.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
        }
    }
}
