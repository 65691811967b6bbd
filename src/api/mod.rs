//! # Gateway HTTP Surface
//!
//! Routes, handlers, error mapping and response rendering for the two
//! login flows.

mod error;
mod handlers;
mod render;
mod routes;
mod server;

pub use error::ApiError;
pub use render::{CertMaterial, CommandSet, GatewayResponse};
pub use routes::{build_router, ApiState};
pub use server::start_server;
