//! # Observability
//!
//! Structured logging setup for the gateway.

mod logging;

pub use logging::init_logging;
