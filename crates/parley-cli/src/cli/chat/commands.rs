//! Slash command parsing for the chat screen.
//!
//! Commands start with `/` and provide in-chat controls; anything else is
//! sent to the room as a message.

use std::io::Write;

use console::style;

/// Available slash commands on the chat screen.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Refresh the feed immediately.
    Refresh,
    /// Show the account profile.
    Profile,
    /// Log out and leave the chat.
    Logout,
    /// Clear the terminal screen.
    Clear,
    /// Leave the chat screen, staying logged in.
    Quit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/refresh" | "/r" => Some(ChatCommand::Refresh),
        "/profile" => Some(ChatCommand::Profile),
        "/logout" => Some(ChatCommand::Logout),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/quit" | "/exit" | "/q" => Some(ChatCommand::Quit),
        _ => Some(ChatCommand::Unknown(cmd)),
    }
}

/// Print the help text listing all available commands.
pub fn print_help(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "  {}", style("Available commands:").bold())?;
    writeln!(writer)?;
    writeln!(
        writer,
        "  {}  {}",
        style("/refresh").cyan(),
        "Refresh the feed now"
    )?;
    writeln!(
        writer,
        "  {}  {}",
        style("/profile").cyan(),
        "Show your profile"
    )?;
    writeln!(
        writer,
        "  {}   {}",
        style("/logout").cyan(),
        "Log out and leave"
    )?;
    writeln!(
        writer,
        "  {}    {}",
        style("/clear").cyan(),
        "Clear the screen"
    )?;
    writeln!(
        writer,
        "  {}     {}",
        style("/quit").cyan(),
        "Leave, staying logged in"
    )?;
    writeln!(
        writer,
        "  {}     {}",
        style("/help").cyan(),
        "Show this help message"
    )?;
    writeln!(writer)?;
    writeln!(
        writer,
        "  {}",
        style("Anything else is sent to the room. Ctrl+D to leave.").dim()
    )?;
    writeln!(writer)?;
    Ok(())
}
