//! Profile CLI command.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use parley_core::client::ProfileClient;
use parley_core::route::{Route, redirect_for};
use parley_types::user::Profile;

use crate::state::AppState;

/// Shown when the fetch fails for a non-auth reason. The cached session
/// user still renders underneath it.
const PROFILE_ERROR: &str = "Could not load profile. Try again later.";

/// Fetch and display the account profile.
///
/// A 401 ends the session like everywhere else. Other failures fall back
/// to the cached session user so the screen still renders.
pub async fn show_profile(state: &AppState, json: bool) -> Result<()> {
    let session_state = state.session.state();
    if redirect_for(Route::Profile, &session_state).is_some() {
        if json {
            println!("{}", serde_json::json!({"logged_in": false}));
        } else {
            println!();
            println!(
                "  {} Not logged in. Run {} first.",
                style("i").blue().bold(),
                style("parley login").yellow()
            );
            println!();
        }
        return Ok(());
    }
    let cached = session_state.user().cloned();

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    progress.set_message("Loading profile...");
    progress.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = state.profile.get_profile().await;
    progress.finish_and_clear();

    let (profile, stale) = match result {
        Ok(profile) => (profile, false),
        Err(error) if error.is_unauthorized() => {
            state.session.logout().await;
            if json {
                println!("{}", serde_json::json!({"logged_in": false}));
            } else {
                println!();
                println!(
                    "  {} Session expired. Run {} to log in again.",
                    style("!").yellow().bold(),
                    style("parley login").yellow()
                );
                println!();
            }
            return Ok(());
        }
        Err(error) => {
            warn!(error = %error, "Profile fetch failed, showing cached session user");
            match &cached {
                Some(user) => (Profile::from_user(user), true),
                None => return Err(error.into()),
            }
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": profile.id,
                "username": profile.username,
                "created_at": profile.created_at.to_rfc3339(),
                "cached": stale,
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("●").green(),
        style(&profile.username).cyan().bold()
    );
    println!();
    println!("  {}  {}", style("ID:").bold(), profile.id);
    println!(
        "  {}  {}",
        style("Member since:").bold(),
        profile.created_at.format("%Y-%m-%d")
    );
    if stale {
        println!();
        println!(
            "  {} {}",
            style("!").yellow().bold(),
            style(PROFILE_ERROR).dim()
        );
        println!("  {}", style("Showing locally cached details.").dim());
    }
    println!();
    Ok(())
}
