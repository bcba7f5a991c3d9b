//! Chat screen orchestration.
//!
//! Wires the feed engine to the terminal: the drive task maps session
//! transitions to feed runs, the route guard keeps the screen legal, and a
//! render task prints feed updates through the readline-aware writer while
//! the input loop handles messages and slash commands. A forced logout
//! tears the screen down from under the prompt.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use console::style;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use rustyline_async::SharedWriter;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use parley_core::chat::{FeedPhase, FeedState};
use parley_core::client::ProfileClient;
use parley_core::route::{Route, RouteGuard};
use parley_types::error::SendError;
use parley_types::session::Credentials;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{FeedRenderer, RenderPlan, format_message};

/// How the screen was left, for the goodbye line.
enum Exit {
    Left,
    LoggedOut,
    SessionEnded,
}

/// Run the interactive chat screen.
pub async fn run_chat_loop(state: &AppState) -> Result<()> {
    let guard = Arc::new(RouteGuard::new(state.session.subscribe()));

    // Anonymous entry falls into the login screen first, like the guarded
    // home route.
    if guard.navigate(Route::Chat) == Route::Login {
        println!();
        println!("  {} You need to log in first.", style("i").blue().bold());
        println!();
        if !prompt_login(state).await? {
            return Ok(());
        }
        guard.navigate(Route::Chat);
    }

    let session_state = state.session.state();
    let Some(active) = session_state.session().cloned() else {
        return Ok(());
    };

    print_welcome_banner(
        &active.user.username,
        &state.config.base_url,
        state.config.refresh_interval_secs,
    );

    // Subscribe before anything can move so no redirect slips past unseen.
    let mut route_rx = guard.subscribe();
    let shutdown = CancellationToken::new();
    let guard_task = tokio::spawn({
        let guard = Arc::clone(&guard);
        let shutdown = shutdown.clone();
        async move { guard.run(shutdown).await }
    });

    // Start the run for the current session now; the drive task takes over
    // from here and is a no-op for the epoch already running.
    state.sync.start(&active).await;
    let mut feed_rx = state.sync.subscribe();
    let drive = tokio::spawn(Arc::clone(&state.sync).drive(shutdown.clone()));

    // Hold the screen until the initial load resolves.
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    progress.set_message("Loading messages...");
    progress.enable_steady_tick(std::time::Duration::from_millis(80));
    let _ = feed_rx.wait_for(|s| s.phase != FeedPhase::Loading).await;
    progress.finish_and_clear();

    let (mut input, mut writer) = ChatInput::open(&active.user.username)
        .map_err(|e| anyhow::anyhow!("Failed to open the chat prompt: {e}"))?;

    let view = FeedView {
        renderer: FeedRenderer::new(),
        writer: writer.clone(),
        own_username: active.user.username.clone(),
        shown_error: None,
    };
    let render = tokio::spawn(render_feed(state.sync.subscribe(), view, shutdown.clone()));

    let mut exit = Exit::Left;

    loop {
        tokio::select! {
            event = input.read_line() => match event {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    writeln!(writer, "  {}", style("Ctrl+D or /quit to leave.").dim())?;
                }
                InputEvent::Message(text) => {
                    if let Some(command) = commands::parse(&text) {
                        match command {
                            ChatCommand::Help => commands::print_help(&mut writer)?,
                            ChatCommand::Refresh => {
                                if !state.sync.refresh_now().await {
                                    writeln!(writer, "  {}", style("Feed is not active.").dim())?;
                                }
                            }
                            ChatCommand::Profile => show_profile_inline(state, &mut writer).await?,
                            ChatCommand::Logout => {
                                state.session.logout().await;
                                exit = Exit::LoggedOut;
                                // The route arm below finishes the teardown.
                            }
                            ChatCommand::Clear => input.clear(),
                            ChatCommand::Quit => break,
                            ChatCommand::Unknown(name) => {
                                writeln!(
                                    writer,
                                    "  {} Unknown command: {}. Type /help for available commands.",
                                    style("?").yellow().bold(),
                                    style(name).dim()
                                )?;
                            }
                        }
                        continue;
                    }
                    match state.sync.send(&text).await {
                        Ok(()) => {}
                        Err(SendError::EmptyText) => {}
                        Err(SendError::Inactive) => {
                            writeln!(
                                writer,
                                "  {} Chat is not active anymore.",
                                style("!").yellow().bold()
                            )?;
                        }
                        Err(SendError::Api(error)) if error.is_unauthorized() => {
                            // Forced logout is already underway; the route
                            // arm ends the loop.
                        }
                        Err(SendError::Api(error)) => {
                            writeln!(
                                writer,
                                "  {} Could not send: {}",
                                style("!").red().bold(),
                                error
                            )?;
                        }
                    }
                }
            },
            changed = route_rx.changed() => {
                if changed.is_err() || *route_rx.borrow_and_update() != Route::Chat {
                    if !matches!(exit, Exit::LoggedOut) {
                        exit = Exit::SessionEnded;
                    }
                    break;
                }
            }
        }
    }

    shutdown.cancel();
    let _ = render.await;
    let _ = guard_task.await;
    let _ = drive.await;
    drop(input);

    print_goodbye(exit);
    Ok(())
}

fn print_goodbye(exit: Exit) {
    println!();
    match exit {
        Exit::Left => println!("  {}", style("Left the chat.").dim()),
        Exit::LoggedOut => println!("  {} Logged out.", style("✓").green().bold()),
        Exit::SessionEnded => println!(
            "  {} Session ended. Run {} to log in again.",
            style("!").yellow().bold(),
            style("parley login").yellow()
        ),
    }
    println!();
}

/// Inline login prompt for anonymous entry. Returns whether a session was
/// established.
async fn prompt_login(state: &AppState) -> Result<bool> {
    loop {
        let username: String = Input::new()
            .with_prompt("Username (empty to abort)")
            .allow_empty(true)
            .interact_text()?;
        if username.trim().is_empty() {
            return Ok(false);
        }
        let password = Password::new().with_prompt("Password").interact()?;

        match state
            .session
            .login(&Credentials::new(username, password))
            .await
        {
            Ok(user) => {
                println!(
                    "  {} Welcome back, {}.",
                    style("✓").green().bold(),
                    style(&user.username).cyan()
                );
                return Ok(true);
            }
            Err(error) => {
                println!("  {} {}", style("!").red().bold(), error);
            }
        }
    }
}

/// Fetch and print the profile without leaving the chat screen.
async fn show_profile_inline(state: &AppState, writer: &mut SharedWriter) -> Result<()> {
    match state.profile.get_profile().await {
        Ok(profile) => {
            writeln!(
                writer,
                "  {} {} (id {}), member since {}",
                style("●").green(),
                style(&profile.username).cyan().bold(),
                profile.id,
                profile.created_at.format("%Y-%m-%d")
            )?;
        }
        Err(error) if error.is_unauthorized() => {
            warn!("Profile fetch rejected, ending session");
            state.session.logout().await;
        }
        Err(error) => {
            warn!(error = %error, "Profile fetch failed");
            writeln!(
                writer,
                "  {} Could not load profile. Try again later.",
                style("!").yellow().bold()
            )?;
        }
    }
    Ok(())
}

/// Everything the render task needs to turn feed snapshots into lines.
struct FeedView {
    renderer: FeedRenderer,
    writer: SharedWriter,
    own_username: String,
    shown_error: Option<String>,
}

impl FeedView {
    fn render(&mut self, snapshot: &FeedState) -> std::io::Result<()> {
        match snapshot.phase {
            FeedPhase::Active => {
                match self.renderer.plan(snapshot.feed.as_slice()) {
                    RenderPlan::Nothing => {}
                    RenderPlan::EmptyHint => {
                        if snapshot.last_error.is_none() {
                            writeln!(self.writer, "  {}", style("No messages yet. Say hi!").dim())?;
                        } else {
                            // A failed load is not a known-empty room; keep
                            // the hint available for when one arrives.
                            self.renderer.reset();
                        }
                    }
                    RenderPlan::Append(tail) => {
                        for message in tail {
                            writeln!(
                                self.writer,
                                "{}",
                                format_message(message, &self.own_username)
                            )?;
                        }
                    }
                    RenderPlan::Redraw(all) => {
                        writeln!(self.writer, "  {}", style("--- refreshed ---").dim())?;
                        for message in all {
                            writeln!(
                                self.writer,
                                "{}",
                                format_message(message, &self.own_username)
                            )?;
                        }
                    }
                }
                if snapshot.last_error != self.shown_error {
                    if let Some(line) = &snapshot.last_error {
                        writeln!(
                            self.writer,
                            "  {} {}",
                            style("!").yellow().bold(),
                            style(line).dim()
                        )?;
                    }
                    self.shown_error = snapshot.last_error.clone();
                }
            }
            FeedPhase::Loading | FeedPhase::Inactive => {
                self.renderer.reset();
                self.shown_error = None;
            }
        }
        Ok(())
    }
}

/// Print feed updates as they arrive, without clobbering the prompt.
async fn render_feed(
    mut rx: watch::Receiver<FeedState>,
    mut view: FeedView,
    shutdown: CancellationToken,
) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if let Err(error) = view.render(&snapshot) {
            warn!(error = %error, "Feed rendering failed");
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
