//! Infrastructure layer for Parley.
//!
//! Contains implementations of the traits defined in `parley-core`:
//! reqwest-backed clients for the chat backend, the file-backed session
//! store, and configuration loading.

pub mod config;
pub mod http;
pub mod store;
