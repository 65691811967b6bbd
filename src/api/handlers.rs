//! HTTP handlers: the identity-verification and credential-exchange
//! pipeline.
//!
//! Control flow per request:
//! challenge/OAuth adapter → credential exchange → certificate issuance →
//! renderer. Every step is sequential and terminal on failure; callers
//! restart the flow rather than relying on retries.

use std::collections::HashMap;

use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::{OAuthClient, STATE_COOKIE};
use crate::errors::{Error, Result};
use crate::secrets::issue_all;

use super::error::ApiError;
use super::render::{self, CommandSet, GatewayResponse};
use super::routes::ApiState;

#[derive(Debug, Deserialize)]
pub struct ChallengeParams {
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub user: String,
    pub token: String,
    pub signature: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CallForm {
    pub user: String,
    pub token: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Form extractor for the API surface: a missing or unparseable field is a
/// 400 through [`ApiError`], not axum's built-in 422 rejection, so the
/// error type stays the single status-mapping point.
pub struct GatewayForm<T>(pub T);

impl<T, S> FromRequest<S> for GatewayForm<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        match Form::<T>::from_request(req, state).await {
            Ok(Form(value)) => Ok(Self(value)),
            Err(rejection) => {
                Err(ApiError(Error::bad_request(format!("malformed form body: {}", rejection))))
            }
        }
    }
}

/// `GET /auth/{provider}/challenge?user=<name>` — issue a single-use
/// challenge code, returned as the plain-text body.
pub async fn challenge_handler(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    Query(params): Query<ChallengeParams>,
) -> std::result::Result<String, ApiError> {
    ensure_known_provider(&state, &provider)?;

    if params.user.is_empty() {
        return Err(Error::bad_request("missing required parameter 'user'").into());
    }

    let code = state.challenges.issue(&params.user).await.map_err(|e| {
        error!(user = %params.user, error = %e, "challenge code allocation failed");
        e
    })?;

    info!(user = %params.user, provider = %provider, "issued challenge code");
    Ok(code)
}

/// `POST /auth/{provider}/verify` — two-phase login completion.
///
/// Order matters: the signature is checked against the claimed code first,
/// then the stored code is atomically popped, then compared. A second
/// verify with the same code fails because the pop already removed it.
pub async fn verify_handler(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    GatewayForm(form): GatewayForm<VerifyForm>,
) -> std::result::Result<Json<GatewayResponse>, ApiError> {
    ensure_known_provider(&state, &provider)?;

    if form.user.is_empty() {
        return Err(Error::bad_request("missing required field 'user'").into());
    }

    state
        .verifier
        .verify(&form.user, form.code.as_bytes(), form.signature.as_bytes())
        .await
        .map_err(|e| log_auth_failure(&form.user, e))?;

    let stored = state.challenges.pop(&form.user).await.ok_or_else(|| {
        warn!(user = %form.user, "no challenge code on record");
        Error::internal(format!("no challenge code on record for user '{}'", form.user))
    })?;

    // The signature already proved knowledge of some code; a mismatch here
    // is a protocol violation, not a normal auth failure.
    if stored != form.code {
        warn!(user = %form.user, "challenge code mismatch");
        return Err(Error::internal("challenge code mismatch").into());
    }

    let response = complete_exchange(&state, &provider, &form.user, &form.token).await?;
    info!(user = %form.user, provider = %provider, "challenge login completed");
    Ok(Json(response))
}

/// `POST /auth/{provider}` — single-shot, non-interactive login. Verifies
/// the signature directly against the presented token; no challenge code
/// is involved, so this path is replayable by design.
pub async fn call_handler(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    GatewayForm(form): GatewayForm<CallForm>,
) -> std::result::Result<Json<GatewayResponse>, ApiError> {
    ensure_known_provider(&state, &provider)?;

    if form.user.is_empty() {
        return Err(Error::bad_request("missing required field 'user'").into());
    }

    state
        .verifier
        .verify(&form.user, form.token.as_bytes(), form.signature.as_bytes())
        .await
        .map_err(|e| log_auth_failure(&form.user, e))?;

    let response = complete_exchange(&state, &provider, &form.user, &form.token).await?;
    info!(user = %form.user, provider = %provider, "single-shot login completed");
    Ok(Json(response))
}

/// `GET /` — OAuth login initiation: bind a CSRF state to the browser via
/// a short-lived cookie and redirect to the provider.
pub async fn oauth_login_handler(State(state): State<ApiState>, jar: CookieJar) -> Response {
    let csrf = OAuthClient::generate_state();
    match state.oauth.authorize_url(&csrf) {
        Ok(url) => {
            let jar = jar.add(OAuthClient::state_cookie(csrf));
            (jar, Redirect::temporary(&url)).into_response()
        }
        Err(err) => {
            error!(error = %err, "failed to build authorization URL");
            html_error(&err)
        }
    }
}

pub async fn oauth_callback_get(
    State(state): State<ApiState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    complete_callback(state, jar, params).await
}

pub async fn oauth_callback_post(
    State(state): State<ApiState>,
    jar: CookieJar,
    Form(params): Form<CallbackParams>,
) -> Response {
    complete_callback(state, jar, params).await
}

/// OAuth callback completion, rendered as HTML either way.
async fn complete_callback(state: ApiState, jar: CookieJar, params: CallbackParams) -> Response {
    match callback_flow(&state, &jar, params).await {
        Ok(response) => {
            info!(provider = %state.oauth.provider(), "oauth login completed");
            let set = CommandSet::build(&response);
            Html(render::success_page(&set)).into_response()
        }
        Err(err) => {
            match &err {
                Error::Unauthorized(_) => warn!(error = %err, "oauth callback rejected"),
                _ => error!(error = %err, "oauth callback failed"),
            }
            html_error(&err)
        }
    }
}

async fn callback_flow(
    state: &ApiState,
    jar: &CookieJar,
    params: CallbackParams,
) -> Result<GatewayResponse> {
    // Without the cookie there is no CSRF binding to check against.
    let cookie = jar
        .get(STATE_COOKIE)
        .ok_or_else(|| Error::internal("missing oauth state cookie"))?;

    let returned = params
        .state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::unauthorized("callback missing state parameter"))?;

    if returned != cookie.value() {
        return Err(Error::unauthorized("oauth state mismatch"));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::unauthorized("callback missing code parameter"))?;

    let access_token = state.oauth.exchange_code(&code).await?;
    complete_exchange(state, &state.oauth.provider().to_string(), "", &access_token).await
}

/// Verified identity → backend session → certificate bundles → response.
///
/// The session lives only for the duration of the issuance calls; nothing
/// is cached or persisted server-side.
async fn complete_exchange(
    state: &ApiState,
    provider: &str,
    user: &str,
    secret: &str,
) -> Result<GatewayResponse> {
    let secrets = HashMap::from([("token".to_string(), secret.to_string())]);

    let session = state.exchange.exchange(provider, &secrets).await.map_err(|e| match e {
        Error::Unauthorized(_) => log_auth_failure(user, e),
        e => {
            error!(user = %user, error = %e, "credential exchange failed");
            e
        }
    })?;

    let bundles = issue_all(&session, &state.config.certs).await?;
    Ok(GatewayResponse::new(session.token().to_string(), bundles))
}

fn ensure_known_provider(state: &ApiState, provider: &str) -> std::result::Result<(), ApiError> {
    if state.exchange.is_known_provider(provider) {
        Ok(())
    } else {
        warn!(provider = %provider, "request for unknown provider");
        Err(Error::unknown_provider(provider).into())
    }
}

fn log_auth_failure(user: &str, err: Error) -> Error {
    warn!(user = %user, error = %err, "authentication failed");
    err
}

fn html_error(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Html(render::error_page(err.status_code(), &err.to_string()))).into_response()
}
