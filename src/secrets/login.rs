//! Backend login methods and the provider registry.
//!
//! A verified identity is exchanged for a Vault token through a
//! provider-specific login call. Providers are registered in a
//! [`LoginRegistry`] keyed by provider kind; adding a provider means
//! registering a new login method, never branching deeper in the pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::{Error, Result};

/// One provider-specific login call against the secrets backend.
///
/// Returns the backend-issued client token on success. Implementations for
/// auth methods `vaultrs` does not model go straight through Vault's HTTP
/// API.
#[async_trait]
pub trait BackendLogin: Send + Sync {
    async fn login(
        &self,
        http: &reqwest::Client,
        vault_addr: &str,
        secrets: &HashMap<String, String>,
    ) -> Result<String>;
}

/// Registry mapping provider kind to its backend login method.
#[derive(Default)]
pub struct LoginRegistry {
    methods: HashMap<String, Arc<dyn BackendLogin>>,
}

impl LoginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: impl Into<String>, method: Arc<dyn BackendLogin>) {
        self.methods.insert(kind.into(), method);
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn BackendLogin>> {
        self.methods.get(kind).cloned()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.methods.contains_key(kind)
    }

    /// Build the registry from configuration. A configured provider with no
    /// matching login method is fatal here, before the listener binds.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let method: Arc<dyn BackendLogin> = match config.oauth.provider.as_str() {
            "github" => Arc::new(GithubLogin::default()),
            other => {
                return Err(Error::config(format!(
                    "no backend login method registered for provider '{}'",
                    other
                )))
            }
        };

        let mut registry = Self::new();
        // Both front doors exchange through the same backend method: the
        // OAuth callback under the provider kind, the challenge flow under
        // its route name.
        registry.register(config.oauth.provider.clone(), method.clone());
        registry.register(config.verifier.provider.clone(), method);
        Ok(registry)
    }
}

/// Vault GitHub auth method: `POST /v1/auth/<mount>/login` with the user's
/// GitHub token.
pub struct GithubLogin {
    mount: String,
}

impl Default for GithubLogin {
    fn default() -> Self {
        Self { mount: "github".to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: Option<String>,
}

#[async_trait]
impl BackendLogin for GithubLogin {
    async fn login(
        &self,
        http: &reqwest::Client,
        vault_addr: &str,
        secrets: &HashMap<String, String>,
    ) -> Result<String> {
        let token = secrets
            .get("token")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthorized("github login requires a token"))?;

        let url = format!("{}/v1/auth/{}/login", vault_addr.trim_end_matches('/'), self.mount);
        debug!(mount = %self.mount, "authenticating against secrets backend");

        let response = http
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| Error::backend(format!("backend login request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::unauthorized(format!(
                "backend rejected login (status {})",
                response.status()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::backend(format!("backend login response malformed: {}", e)))?;

        login
            .auth
            .and_then(|a| a.client_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthorized("backend returned an empty secret"))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{AppConfig, CertSpec, VaultConfig};

    fn secrets(token: &str) -> HashMap<String, String> {
        HashMap::from([("token".to_string(), token.to_string())])
    }

    #[tokio::test]
    async fn test_github_login_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/github/login"))
            .and(body_json(serde_json::json!({ "token": "gho_abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "auth": { "client_token": "hvs.token" }
            })))
            .mount(&server)
            .await;

        let login = GithubLogin::default();
        let token =
            login.login(&reqwest::Client::new(), &server.uri(), &secrets("gho_abc")).await.unwrap();
        assert_eq!(token, "hvs.token");
    }

    #[tokio::test]
    async fn test_github_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/github/login"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let login = GithubLogin::default();
        let err = login
            .login(&reqwest::Client::new(), &server.uri(), &secrets("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_github_login_empty_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/github/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "auth": {} })))
            .mount(&server)
            .await;

        let login = GithubLogin::default();
        let err = login
            .login(&reqwest::Client::new(), &server.uri(), &secrets("gho_abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_github_login_missing_token() {
        let login = GithubLogin::default();
        let err = login
            .login(&reqwest::Client::new(), "http://127.0.0.1:1", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    fn config(provider: &str) -> AppConfig {
        let mut config = AppConfig {
            vault: VaultConfig { address: "http://127.0.0.1:8200".to_string(), ..Default::default() },
            certs: vec![CertSpec {
                common_name: "svc.example.com".to_string(),
                path: "pki/issue/server".to_string(),
                format: None,
                ttl: None,
                alt_names: None,
                ip_sans: None,
            }],
            ..Default::default()
        };
        config.oauth.provider = provider.to_string();
        config
    }

    #[test]
    fn test_registry_from_config() {
        let registry = LoginRegistry::from_config(&config("github")).unwrap();
        assert!(registry.contains("github"));
        assert!(registry.contains("stns"));
        assert!(!registry.contains("notfound"));
    }

    #[test]
    fn test_registry_unknown_method_fatal() {
        assert!(matches!(LoginRegistry::from_config(&config("gitlab")), Err(Error::Config(_))));
    }
}
