//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley client:
//! User, Message, SessionState, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! secrecy.

pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod user;
