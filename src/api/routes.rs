//! Router construction and shared request state.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::{ChallengeStore, OAuthClient, SignatureVerifier};
use crate::config::AppConfig;
use crate::secrets::CredentialExchange;

use super::handlers::{
    call_handler, challenge_handler, oauth_callback_get, oauth_callback_post, oauth_login_handler,
    verify_handler,
};

/// Shared state for all request flows. Everything here is either immutable
/// configuration or a store that guarantees its own atomicity; request
/// handling never mutates shared state beyond the challenge store.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<AppConfig>,
    pub challenges: Arc<dyn ChallengeStore>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub oauth: Arc<OAuthClient>,
    pub exchange: Arc<CredentialExchange>,
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(oauth_login_handler))
        .route("/callback", get(oauth_callback_get).post(oauth_callback_post))
        .route("/auth/{provider}/challenge", get(challenge_handler))
        .route("/auth/{provider}/verify", post(verify_handler))
        .route("/auth/{provider}", post(call_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
