//! Auth CLI commands: register, login, logout, whoami.

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

use parley_core::route::{Route, redirect_for};
use parley_types::session::Credentials;
use parley_types::user::User;

use crate::state::AppState;

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

fn prompt_username(given: Option<String>) -> Result<String> {
    match given {
        Some(name) => Ok(name),
        None => Ok(Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?),
    }
}

/// Print the guard message for auth screens when a session already exists.
fn print_already_logged_in(username: &str, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({"logged_in": true, "username": username})
        );
        return;
    }
    println!();
    println!(
        "  {} Already logged in as {}. Run {} first.",
        style("i").blue().bold(),
        style(username).cyan(),
        style("parley logout").yellow()
    );
    println!();
}

fn print_logged_in(headline: &str, user: &User, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "logged_in": true,
                "id": user.id,
                "username": user.username,
            })
        );
        return;
    }
    println!();
    println!(
        "  {} {} Logged in as {}.",
        style("✓").green().bold(),
        headline,
        style(&user.username).cyan()
    );
    println!();
    println!("  Open the chat: {}", style("parley chat").yellow());
    println!();
}

/// Create an account and log in.
///
/// # Examples
///
/// ```bash
/// # Interactive prompts
/// parley register
///
/// # Username from a flag, password still prompted
/// parley register --username alice
/// ```
pub async fn register(state: &AppState, username: Option<String>, json: bool) -> Result<()> {
    let session_state = state.session.state();
    if redirect_for(Route::Register, &session_state).is_some() {
        let name = session_state.user().map(|u| u.username.clone()).unwrap_or_default();
        print_already_logged_in(&name, json);
        return Ok(());
    }

    let username = prompt_username(username)?;
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords don't match")
        .interact()?;
    let credentials = Credentials::new(username, password);

    let progress = spinner("Creating account...");
    let result = state.session.register(&credentials).await;
    progress.finish_and_clear();

    let user = result?;
    print_logged_in("Account created.", &user, json);
    Ok(())
}

/// Log in to an existing account.
pub async fn login(state: &AppState, username: Option<String>, json: bool) -> Result<()> {
    let session_state = state.session.state();
    if redirect_for(Route::Login, &session_state).is_some() {
        let name = session_state.user().map(|u| u.username.clone()).unwrap_or_default();
        print_already_logged_in(&name, json);
        return Ok(());
    }

    let username = prompt_username(username)?;
    let password = Password::new().with_prompt("Password").interact()?;
    let credentials = Credentials::new(username, password);

    let progress = spinner("Logging in...");
    let result = state.session.login(&credentials).await;
    progress.finish_and_clear();

    let user = result?;
    print_logged_in("Welcome back.", &user, json);
    Ok(())
}

/// Log out: best-effort token invalidation, then clear the stored session.
pub async fn logout(state: &AppState, json: bool) -> Result<()> {
    if !state.session.state().is_authenticated() {
        if json {
            println!("{}", serde_json::json!({"logged_out": false}));
        } else {
            println!();
            println!("  {} Not logged in.", style("i").blue().bold());
            println!();
        }
        return Ok(());
    }

    let progress = spinner("Logging out...");
    state.session.logout().await;
    progress.finish_and_clear();

    if json {
        println!("{}", serde_json::json!({"logged_out": true}));
    } else {
        println!();
        println!("  {} Logged out.", style("✓").green().bold());
        println!();
    }
    Ok(())
}

/// Show the locally stored session. Never touches the network.
pub fn whoami(state: &AppState, json: bool) -> Result<()> {
    let session_state = state.session.state();
    let Some(user) = session_state.user() else {
        if json {
            println!("{}", serde_json::json!({"logged_in": false}));
        } else {
            println!();
            println!(
                "  {} Not logged in. Run {} or {}.",
                style("i").blue().bold(),
                style("parley login").yellow(),
                style("parley register").yellow()
            );
            println!();
        }
        return Ok(());
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "logged_in": true,
                "id": user.id,
                "username": user.username,
                "created_at": user.created_at.to_rfc3339(),
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("●").green(),
        style(&user.username).cyan().bold()
    );
    println!(
        "  {}  {}",
        style("Member since:").bold(),
        user.created_at.format("%Y-%m-%d")
    );
    println!();
    Ok(())
}
