//! Welcome banner for the chat screen.

use console::style;

/// Print the banner at the top of the chat screen.
///
/// Shows who is logged in, which backend the feed follows, and how to get
/// help or leave.
pub fn print_welcome_banner(username: &str, base_url: &str, refresh_secs: u64) {
    println!();
    println!("  {}", style("Parley").cyan().bold());
    println!("  {}", style(format!("Connected to {base_url}")).dim());
    println!();
    println!("  {}  {}", style("You:").bold(), style(username).green());
    println!(
        "  {}  {}",
        style("Feed:").bold(),
        style(format!("refreshes every {refresh_secs}s")).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to leave").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
