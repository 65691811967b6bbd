//! OAuth2 authorization-code login adapter.
//!
//! `Login` issues a random CSRF state bound to the browser via a short-lived
//! cookie and redirects to the provider's authorization endpoint; `Callback`
//! compares the returned `state` to the cookie and exchanges the `code` for
//! an access token. A rejected callback requires a fresh login; there is no
//! retry within a state cookie's lifetime.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::Deserialize;

use crate::config::OAuthConfig;
use crate::errors::{Error, Result};

/// Cookie carrying the CSRF state between `Login` and `Callback`.
pub const STATE_COOKIE: &str = "credgate_oauth_state";

/// State cookie lifetime.
const STATE_COOKIE_MINUTES: i64 = 3;

/// Entropy of the CSRF state token, in bytes.
const STATE_BYTES: usize = 16;

/// OAuth2 client for the authorization-code round trip.
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// Provider kind this client authenticates against (selects the backend
    /// login method).
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Generate a fresh URL-safe CSRF state token.
    pub fn generate_state() -> String {
        let mut bytes = [0u8; STATE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Build the state cookie bound to the browser session.
    pub fn state_cookie(state: String) -> Cookie<'static> {
        Cookie::build((STATE_COOKIE, state))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::minutes(STATE_COOKIE_MINUTES))
            .build()
    }

    /// Build the provider authorization URL carrying `state`.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = url::Url::parse(&self.config.auth_url)
            .map_err(|e| Error::config(format!("invalid auth_url: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.config.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::unauthorized(format!("code exchange failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::unauthorized(format!(
                "code exchange failed: token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::unauthorized(format!("code exchange response malformed: {}", e)))?;

        if let Some(error) = token.error {
            return Err(Error::unauthorized(format!(
                "code exchange rejected: {} {}",
                error,
                token.error_description.unwrap_or_default()
            )));
        }

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthorized("token endpoint returned no access token"))
    }
}
