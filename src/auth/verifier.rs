//! Signature verification seam.
//!
//! The gateway never trusts a presented signature directly; it asks a
//! verifier whether the signature over a message checks out against the
//! public keys registered for the user. The production implementation
//! fetches the user's Ed25519 keys from the configured identity endpoint
//! and verifies locally with `ring`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::signature::{UnparsedPublicKey, ED25519};
use tracing::debug;

use crate::errors::{Error, Result};

/// Verifies a signature over a message against the keys registered for a
/// user. Implementations must treat any mismatch as `Error::Unauthorized`.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(&self, user: &str, message: &[u8], signature: &[u8]) -> Result<()>;
}

/// Verifier backed by an HTTP identity endpoint.
///
/// Expects `GET {endpoint}/keys?user={name}` to return a JSON array of
/// base64-encoded Ed25519 public keys. The signature itself is expected
/// base64-encoded, as produced by the CLI client.
pub struct HttpKeyVerifier {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpKeyVerifier {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self { endpoint: endpoint.into(), http }
    }

    async fn fetch_keys(&self, user: &str) -> Result<Vec<String>> {
        let url = format!("{}/keys", self.endpoint.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .query(&[("user", user)])
            .send()
            .await
            .map_err(|e| Error::backend(format!("verifier request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(Error::backend(format!(
                "verifier returned status {} for user '{}'",
                status, user
            )));
        }
        if !status.is_success() {
            return Err(Error::unauthorized(format!(
                "verifier returned status {} for user '{}'",
                status, user
            )));
        }

        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| Error::backend(format!("verifier response malformed: {}", e)))
    }
}

#[async_trait]
impl SignatureVerifier for HttpKeyVerifier {
    async fn verify(&self, user: &str, message: &[u8], signature: &[u8]) -> Result<()> {
        let signature = STANDARD
            .decode(signature)
            .map_err(|_| Error::unauthorized("signature is not valid base64"))?;

        let keys = self.fetch_keys(user).await?;
        if keys.is_empty() {
            return Err(Error::unauthorized(format!("no keys registered for user '{}'", user)));
        }

        for encoded in &keys {
            let Ok(key_bytes) = STANDARD.decode(encoded) else {
                debug!(user = %user, "skipping undecodable registered key");
                continue;
            };
            let key = UnparsedPublicKey::new(&ED25519, key_bytes);
            if key.verify(message, &signature).is_ok() {
                return Ok(());
            }
        }

        Err(Error::unauthorized(format!("signature verification failed for user '{}'", user)))
    }
}

#[cfg(test)]
mod tests {
    use ring::rand::SystemRandom;
    use ring::signature::{Ed25519KeyPair, KeyPair};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn verifier_with_key(keys: Vec<String>) -> (MockServer, HttpKeyVerifier) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .and(query_param("user", "alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(keys))
            .mount(&server)
            .await;
        let verifier = HttpKeyVerifier::new(server.uri(), reqwest::Client::new());
        (server, verifier)
    }

    fn generate_keypair() -> (Ed25519KeyPair, String) {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let public = STANDARD.encode(pair.public_key().as_ref());
        (pair, public)
    }

    #[tokio::test]
    async fn test_valid_signature_accepted() {
        let (pair, public) = generate_keypair();
        let (_server, verifier) = verifier_with_key(vec![public]).await;

        let message = b"abc123";
        let signature = STANDARD.encode(pair.sign(message).as_ref());
        assert!(verifier.verify("alice", message, signature.as_bytes()).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_key_rejected() {
        let (pair, _) = generate_keypair();
        let (_, other_public) = generate_keypair();
        let (_server, verifier) = verifier_with_key(vec![other_public]).await;

        let message = b"abc123";
        let signature = STANDARD.encode(pair.sign(message).as_ref());
        let err = verifier.verify("alice", message, signature.as_bytes()).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_tampered_message_rejected() {
        let (pair, public) = generate_keypair();
        let (_server, verifier) = verifier_with_key(vec![public]).await;

        let signature = STANDARD.encode(pair.sign(b"abc123").as_ref());
        let err = verifier.verify("alice", b"abc124", signature.as_bytes()).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_no_registered_keys_rejected() {
        let (_server, verifier) = verifier_with_key(vec![]).await;
        let err = verifier.verify("alice", b"abc123", b"c2ln").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_verifier_outage_is_a_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let verifier = HttpKeyVerifier::new(server.uri(), reqwest::Client::new());
        let err = verifier.verify("alice", b"abc123", b"c2ln").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let verifier = HttpKeyVerifier::new(server.uri(), reqwest::Client::new());
        let err = verifier.verify("nobody", b"abc123", b"c2ln").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
