//! Domain models shared across the session client.

pub mod auth;
