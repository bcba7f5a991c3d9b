//! Session lifecycle, feed synchronization, and route guarding for Parley.
//!
//! This crate defines the "ports" (backend client and session store traits)
//! that the infrastructure layer implements, plus the engine built on them:
//! `SessionManager`, `ChatSynchronizer`, and `RouteGuard`. It depends only
//! on `parley-types` -- never on `parley-infra` or any HTTP/IO crate.

pub mod chat;
pub mod client;
pub mod route;
pub mod session;
