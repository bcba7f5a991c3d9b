//! Feed rendering for the chat screen.
//!
//! The synchronizer publishes whole feed snapshots. The renderer turns
//! successive snapshots into terminal output: only the appended tail when
//! the window grew in place, a full reprint when it was replaced, and a
//! one-time hint while the room is empty.

use chrono::Local;
use console::style;
use parley_types::message::Message;

/// What to print for a new feed snapshot.
#[derive(Debug, PartialEq)]
pub enum RenderPlan<'a> {
    /// Nothing changed.
    Nothing,
    /// The room is empty; show the hint once.
    EmptyHint,
    /// The previous window is a prefix of the new one; print only the tail.
    Append(&'a [Message]),
    /// The window changed shape; reprint all of it.
    Redraw(&'a [Message]),
}

/// Tracks which message ids have been printed so far.
#[derive(Default)]
pub struct FeedRenderer {
    printed: Vec<i64>,
    empty_hinted: bool,
}

impl FeedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Work out what to print for the next snapshot, and remember the
    /// snapshot as printed.
    pub fn plan<'a>(&mut self, messages: &'a [Message]) -> RenderPlan<'a> {
        let ids: Vec<i64> = messages.iter().map(|m| m.id).collect();
        if ids.is_empty() {
            self.printed.clear();
            if self.empty_hinted {
                return RenderPlan::Nothing;
            }
            self.empty_hinted = true;
            return RenderPlan::EmptyHint;
        }
        self.empty_hinted = false;

        let plan = if ids == self.printed {
            RenderPlan::Nothing
        } else if ids.len() > self.printed.len() && ids[..self.printed.len()] == self.printed[..] {
            RenderPlan::Append(&messages[self.printed.len()..])
        } else {
            RenderPlan::Redraw(messages)
        };
        self.printed = ids;
        plan
    }

    /// Forget printed state so the next snapshot is drawn from scratch.
    pub fn reset(&mut self) {
        self.printed.clear();
        self.empty_hinted = false;
    }
}

/// Format one feed line: local time, author, text. Own messages get the
/// prompt's green so they read as "yours" at a glance.
pub fn format_message(message: &Message, own_username: &str) -> String {
    let time = message.created_at.with_timezone(&Local).format("%H:%M");
    let author = if message.member_username == own_username {
        style(&message.member_username).green().bold()
    } else {
        style(&message.member_username).cyan()
    };
    format!("  {} {}  {}", style(time).dim(), author, message.text)
}
