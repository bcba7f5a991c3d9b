//! Client status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display the client status dashboard.
///
/// Shows version, backend and polling configuration, data dir, and the
/// local session. Never touches the network.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let session_state = state.session.state();
    let username = session_state.user().map(|u| u.username.clone());
    let token_file = state.data_dir.join("session").join("token");
    let has_token_file = tokio::fs::try_exists(&token_file).await.unwrap_or(false);

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "base_url": state.config.base_url,
            "refresh_interval_secs": state.config.refresh_interval_secs,
            "history_limit": state.config.history_limit,
            "logged_in": username.is_some(),
            "username": username,
            "token_file": has_token_file,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Parley v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Session ──").dim());
    match &username {
        Some(name) => println!("  Logged in as {}", style(name).cyan()),
        None => println!("  {}", style("Not logged in").dim()),
    }
    println!(
        "  Token file: {}",
        if has_token_file {
            format!("{}", style("present").green())
        } else {
            format!("{}", style("absent").dim())
        }
    );
    println!();

    println!("  {}", style("── Backend ──").dim());
    println!("  Base URL: {}", style(&state.config.base_url).cyan());
    println!("  Refresh:  every {}s", state.config.refresh_interval_secs);
    println!("  Window:   {} messages", state.config.history_limit);
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!();

    Ok(())
}
