//! Prompt-side input for the chat screen.
//!
//! `ChatInput` owns the readline prompt for the logged-in user and turns
//! raw readline events into chat submissions. The paired `SharedWriter`
//! is the only safe way to print while the prompt is live; bypassing it
//! tears the prompt line.

use console::style;
use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};
use tracing::debug;

/// What the user did at the prompt.
#[derive(Debug)]
pub enum InputEvent {
    /// A non-blank submission, trimmed.
    Message(String),
    /// Ctrl+D.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

/// The chat prompt, labeled with the logged-in username.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Open the prompt for `username`, handing back the writer that may
    /// print around it.
    pub fn open(username: &str) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, writer) = Readline::new(prompt_for(username))?;
        Ok((Self { rl }, writer))
    }

    /// Wait for the next submission.
    ///
    /// Blank lines are swallowed here, so every `Message` carries text.
    /// Cancel safe: the future can race other `select!` arms and be
    /// dropped without losing input.
    pub async fn read_line(&mut self) -> InputEvent {
        loop {
            match self.rl.readline().await {
                Ok(ReadlineEvent::Line(line)) => {
                    let text = line.trim().to_string();
                    if !text.is_empty() {
                        return InputEvent::Message(text);
                    }
                }
                Ok(ReadlineEvent::Eof) => return InputEvent::Eof,
                Ok(ReadlineEvent::Interrupted) => return InputEvent::Interrupted,
                Err(error) => {
                    debug!(error = %error, "Readline closed");
                    return InputEvent::Eof;
                }
            }
        }
    }

    /// Clear the terminal, keeping the prompt.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}

/// Prompt line for a logged-in user, shaped like `  alice > `.
fn prompt_for(username: &str) -> String {
    format!("  {} ", style(format!("{username} >")).green().bold())
}
