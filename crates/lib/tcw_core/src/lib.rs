//! # tcw_core
//!
//! Core session logic for the TCW web client.
//!
//! - [`auth::jwt`]: token codec (claims decoding, expiry)
//! - [`storage`]: durable key-value session persistence
//! - [`profile`]: raw profile to normalized [`models::auth::User`]
//! - [`auth::capabilities`]: role/permission/menu checks over a `User`
//! - [`auth::client`]: token exchange, profile fetch, session queries
//! - [`session`]: observable session state machine
//! - [`guard`]: route gating predicates

pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod profile;
pub mod session;
pub mod storage;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
