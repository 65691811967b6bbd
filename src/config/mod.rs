//! # Configuration Management
//!
//! Immutable process-wide configuration, constructed once in `main` and
//! injected into component constructors.

mod settings;

pub use settings::{
    AppConfig, CertSpec, LogConfig, OAuthConfig, ServerConfig, VaultConfig, VerifierConfig,
};
