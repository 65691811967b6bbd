//! # credgate
//!
//! Credential exchange gateway: verifies a user's identity through either an
//! OAuth2 authorization-code login or an Ed25519 challenge/response
//! exchange, trades the verified identity for a Vault session, issues the
//! configured short-lived TLS certificate bundles and returns everything in
//! one response (JSON for API callers, an HTML page with copy-pasteable
//! shell commands for browsers).
//!
//! Nothing is persisted server-side: every request carries its own secrets
//! in and out, and challenge codes are the only transient state.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application name used in logs and user-facing output.
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Application version from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
