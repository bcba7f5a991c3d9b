//! Session state and credential types for Parley.
//!
//! The session is a single unit of (token, user): both present or neither.
//! That invariant is structural here -- `SessionState` has no shape that
//! carries a token without a user.

use secrecy::SecretString;
use uuid::Uuid;

use crate::user::User;

use std::fmt;

/// Observable state of the client session.
///
/// `Uninitialized` exists only between process start and the one-shot
/// hydration from the persistent store; it is never re-entered.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Anonymous,
    Authenticated(ActiveSession),
}

impl SessionState {
    /// Whether hydration has completed (in either outcome).
    pub fn is_initialized(&self) -> bool {
        !matches!(self, SessionState::Uninitialized)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        match self {
            SessionState::Authenticated(active) => Some(active),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|active| &active.user)
    }
}

/// An established session: the auth token, the account it belongs to, and
/// the epoch under which it was minted.
///
/// The epoch is a client-generated marker, fresh per login/register/
/// hydration. In-flight work tags itself with the epoch it started under
/// and is discarded if a different epoch (or none) is current by the time
/// it completes.
#[derive(Clone, PartialEq)]
pub struct ActiveSession {
    pub token: String,
    pub user: User,
    pub epoch: Uuid,
}

impl ActiveSession {
    /// Establish a session, minting a fresh epoch.
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            epoch: Uuid::now_v7(),
        }
    }
}

// Token kept out of Debug output.
impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("user", &self.user.username)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Login/register input. The password is wrapped so it never appears in
/// Debug output or logs.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Successful auth response: the token plus the account it authenticates.
#[derive(Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("user", &self.user.username)
            .finish_non_exhaustive()
    }
}
