//! Interactive chat screen for Parley.
//!
//! Implements the live group-chat view: feed rendering driven by the
//! synchronizer's watch channel, async line input, slash commands, and a
//! welcome banner. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
