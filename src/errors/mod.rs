//! # Error Handling
//!
//! Typed errors for every adapter in the gateway. The HTTP router is the
//! single place that maps an error kind to a status code and response body.

mod types;

pub use types::{Error, Result};
