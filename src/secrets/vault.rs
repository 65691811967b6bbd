//! Credential exchange against the Vault backend.
//!
//! Maps one verified identity assertion to exactly one backend session.
//! Sessions are owned by the request that created them, never cached and
//! never reused across users. All backend calls share a fixed overall
//! timeout; there is no retry anywhere in this pipeline.

use std::collections::HashMap;

use tracing::debug;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};

use crate::config::VaultConfig;
use crate::errors::{Error, Result};

use super::login::LoginRegistry;

/// An authenticated handle to the secrets backend, created by exchanging
/// exactly one identity assertion for exactly one backend token.
pub struct VaultSession {
    client: VaultClient,
    token: String,
}

impl VaultSession {
    /// The backend-issued bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn client(&self) -> &VaultClient {
        &self.client
    }
}

/// Exchanges verified identities for backend sessions via the provider
/// registry.
pub struct CredentialExchange {
    vault: VaultConfig,
    http: reqwest::Client,
    registry: LoginRegistry,
}

impl CredentialExchange {
    pub fn new(vault: VaultConfig, registry: LoginRegistry) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(vault.timeout())
            .build()
            .map_err(|e| Error::config(format!("failed to build backend HTTP client: {}", e)))?;
        Ok(Self { vault, http, registry })
    }

    /// Whether a provider kind has a registered login method.
    pub fn is_known_provider(&self, kind: &str) -> bool {
        self.registry.contains(kind)
    }

    /// Exchange the secrets of a verified identity for a backend session.
    pub async fn exchange(
        &self,
        provider_kind: &str,
        secrets: &HashMap<String, String>,
    ) -> Result<VaultSession> {
        let method = self
            .registry
            .get(provider_kind)
            .ok_or_else(|| Error::unknown_provider(provider_kind))?;

        let token = method.login(&self.http, &self.vault.address, secrets).await?;
        debug!(provider = %provider_kind, "backend session established");

        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(&self.vault.address);
        settings.token(&token);
        settings.timeout(Some(self.vault.timeout()));
        let settings = settings
            .build()
            .map_err(|e| Error::config(format!("invalid Vault client settings: {}", e)))?;

        let client = VaultClient::new(settings)
            .map_err(|e| Error::backend(format!("failed to create Vault client: {}", e)))?;

        Ok(VaultSession { client, token })
    }
}
