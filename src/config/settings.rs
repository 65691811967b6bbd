//! # Configuration Settings
//!
//! Defines the configuration structure for the credgate gateway.
//!
//! Configuration is loaded once at process start (optional file plus
//! `CREDGATE_*` environment overrides), validated, and then passed by
//! reference into each component constructor. Request-handling code never
//! reads ambient global state.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[validate(nested)]
    #[serde(default)]
    pub log: LogConfig,

    /// OAuth provider configuration
    #[validate(nested)]
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Challenge/response verifier configuration
    #[validate(nested)]
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// Secrets backend (Vault) configuration
    #[validate(nested)]
    #[serde(default)]
    pub vault: VaultConfig,

    /// Certificate issuance specs, ordered. Issued in order per request.
    #[validate(length(min = 1, message = "at least one certificate spec is required"))]
    #[serde(default)]
    pub certs: Vec<CertSpec>,
}

impl AppConfig {
    /// Load configuration from an optional file plus `CREDGATE_*` environment
    /// overrides (e.g. `CREDGATE_SERVER__LISTENER`). `VAULT_ADDR` is honored
    /// as the well-known backend address variable.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("CREDGATE").separator("__"))
            .build()?;

        let mut app: AppConfig = settings.try_deserialize()?;

        if app.vault.address.is_empty() {
            if let Ok(addr) = std::env::var("VAULT_ADDR") {
                app.vault.address = addr;
            }
        }

        Ok(app)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        if self.vault.address.is_empty() {
            return Err(Error::config(
                "Vault address is required (set VAULT_ADDR or vault.address)",
            ));
        }

        for field in [
            ("oauth.auth_url", &self.oauth.auth_url),
            ("oauth.token_url", &self.oauth.token_url),
            ("oauth.redirect_url", &self.oauth.redirect_url),
        ] {
            url::Url::parse(field.1)
                .map_err(|e| Error::config(format!("invalid {}: {}", field.0, e)))?;
        }

        for cert in &self.certs {
            cert.mount_and_role()?;
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Listener address, `host:port`
    #[validate(length(min = 1, message = "listener cannot be empty"))]
    pub listener: String,

    /// Optional PID file written on startup
    pub pid_file: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listener: "localhost:18080".to_string(), pid_file: None }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "log level cannot be empty"))]
    pub level: String,

    /// Optional log file; stdout when unset
    pub file: Option<String>,

    /// Emit JSON-formatted logs
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), file: None, json: false }
    }
}

/// OAuth2 authorization-code provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OAuthConfig {
    /// Provider kind, selects the backend login method (e.g. "github")
    #[validate(length(min = 1, message = "oauth provider cannot be empty"))]
    pub provider: String,

    pub client_id: String,
    pub client_secret: String,

    /// Authorization endpoint the browser is redirected to
    pub auth_url: String,

    /// Token endpoint the authorization code is exchanged against
    pub token_url: String,

    /// Redirect URL registered with the provider
    pub redirect_url: String,

    /// Requested scopes
    pub scopes: Vec<String>,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            provider: "github".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            redirect_url: "http://localhost:18080/callback".to_string(),
            scopes: vec!["user".to_string()],
        }
    }
}

/// Challenge/response verifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifierConfig {
    /// Route-level provider name for the challenge flow (e.g. "stns")
    #[validate(length(min = 1, message = "verifier provider cannot be empty"))]
    pub provider: String,

    /// Endpoint serving registered user public keys
    pub endpoint: String,

    /// Challenge code time-to-live in seconds
    pub challenge_ttl_seconds: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self { provider: "stns".to_string(), endpoint: String::new(), challenge_ttl_seconds: 300 }
    }
}

impl VerifierConfig {
    pub fn challenge_ttl(&self) -> Duration {
        Duration::from_secs(self.challenge_ttl_seconds)
    }
}

/// Secrets backend (Vault) configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VaultConfig {
    /// Vault server address; falls back to `VAULT_ADDR`
    pub address: String,

    /// Overall client timeout in seconds
    #[validate(range(min = 1, max = 300, message = "timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { address: String::new(), timeout_seconds: 30 }
    }
}

impl VaultConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// One certificate issuance spec. Read-only after startup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CertSpec {
    /// Certificate common name (mandatory)
    #[validate(length(min = 1, message = "common_name cannot be empty"))]
    pub common_name: String,

    /// Vault PKI issuance path, `<mount>/issue/<role>`
    #[validate(length(min = 1, message = "path cannot be empty"))]
    pub path: String,

    /// Certificate format (omitted from the request when unset)
    #[serde(default)]
    pub format: Option<String>,

    /// Requested TTL (omitted when unset)
    #[serde(default)]
    pub ttl: Option<String>,

    /// Comma-separated alternative names (omitted when unset)
    #[serde(default)]
    pub alt_names: Option<String>,

    /// Comma-separated IP SANs (omitted when unset)
    #[serde(default)]
    pub ip_sans: Option<String>,
}

impl CertSpec {
    /// Split the issuance path into PKI mount and role name.
    pub fn mount_and_role(&self) -> Result<(&str, &str)> {
        self.path
            .split_once("/issue/")
            .filter(|(mount, role)| !mount.is_empty() && !role.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "certificate path '{}' must have the form '<mount>/issue/<role>'",
                    self.path
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
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
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_vault_address() {
        let mut config = base_config();
        config.vault.address.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_cert_list_rejected() {
        let mut config = base_config();
        config.certs.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cert_path_shape() {
        let mut config = base_config();
        config.certs[0].path = "pki/sign/server".to_string();
        assert!(config.validate().is_err());

        config.certs[0].path = "pki_int/issue/web".to_string();
        assert!(config.validate().is_ok());
        assert_eq!(config.certs[0].mount_and_role().unwrap(), ("pki_int", "web"));
    }

    #[test]
    fn test_invalid_oauth_url() {
        let mut config = base_config();
        config.oauth.auth_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.listener, "localhost:18080");
        assert_eq!(config.verifier.provider, "stns");
        assert_eq!(config.vault.timeout_seconds, 30);
        assert_eq!(config.oauth.scopes, vec!["user".to_string()]);
    }
}
