//! Chat feed synchronization for Parley.
//!
//! This module owns the observable feed state and the `ChatSynchronizer`
//! that keeps it aligned with the backend while a session is active.

pub mod synchronizer;

pub use synchronizer::ChatSynchronizer;

use parley_types::message::MessageFeed;

/// Lifecycle phase of the message feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// No active session; the feed is empty and untended.
    Inactive,
    /// First load of a fresh run is in flight.
    Loading,
    /// The feed reflects the last successful fetch and is being refreshed
    /// in the background.
    Active,
}

/// Observable state of the message feed.
///
/// Published through a `tokio::sync::watch` channel; screens render
/// snapshots of this and never touch the feed directly.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub phase: FeedPhase,
    pub feed: MessageFeed,
    /// Human-readable load failure, shown alongside whatever feed content
    /// is still valid. Cleared by the next successful fetch.
    pub last_error: Option<String>,
}

impl FeedState {
    pub fn inactive() -> Self {
        Self {
            phase: FeedPhase::Inactive,
            feed: MessageFeed::new(),
            last_error: None,
        }
    }

    pub(crate) fn loading() -> Self {
        Self {
            phase: FeedPhase::Loading,
            feed: MessageFeed::new(),
            last_error: None,
        }
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::inactive()
    }
}
