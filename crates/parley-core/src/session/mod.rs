//! Session lifecycle for Parley.
//!
//! This module defines the `SessionStore` trait that the infrastructure
//! layer implements, and the `SessionManager` that owns the observable
//! session state.

pub mod manager;
pub mod store;

pub use manager::SessionManager;
pub use store::SessionStore;
