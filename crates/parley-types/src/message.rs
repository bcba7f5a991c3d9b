//! Chat message and feed types for Parley.
//!
//! Messages are immutable once received. The feed is an ordered, id-unique
//! window over the room history: refreshes replace it wholesale, a send
//! with an echoed record appends exactly one entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message in the shared room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub member_username: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of posting a message.
///
/// The backend normally echoes the created record; some deployments answer
/// with an empty body instead, in which case the caller refreshes the feed
/// to pick the message up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReceipt {
    /// The created message, ready for optimistic append.
    Created(Message),
    /// Accepted without an echo. Refresh to observe the message.
    Accepted,
}

impl SendReceipt {
    pub fn into_message(self) -> Option<Message> {
        match self {
            SendReceipt::Created(msg) => Some(msg),
            SendReceipt::Accepted => None,
        }
    }
}

/// The in-memory message window, ordered as the backend returned it and
/// unique by message id.
///
/// Owned exclusively by the chat synchronizer; everything else sees
/// snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFeed {
    messages: Vec<Message>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole window with a freshly fetched one.
    ///
    /// Duplicate ids in the input collapse to their first occurrence.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages.clear();
        for msg in messages {
            if !self.contains(msg.id) {
                self.messages.push(msg);
            }
        }
    }

    /// Append a single message unless its id is already present.
    ///
    /// Returns whether the message was actually added, so callers can tell
    /// an optimistic append apart from a refresh that beat it.
    pub fn push(&mut self, message: Message) -> bool {
        if self.contains(message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn contains(&self, id: i64) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}
