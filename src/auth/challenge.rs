//! Challenge-code store for the two-phase login flow.
//!
//! A challenge code is a short-lived, single-use random value issued per
//! user, to be signed as proof of private-key possession. The store's core
//! primitive is an atomic `pop` (get-and-delete): two concurrent verify
//! attempts for the same user can never both observe the same unconsumed
//! code. That pop-once discipline is the replay-prevention mechanism for
//! the whole gateway.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use tokio::sync::Mutex;

use crate::errors::Result;

/// Entropy of an issued challenge code, in bytes.
const CHALLENGE_CODE_BYTES: usize = 32;

/// Single-use challenge code storage, keyed by username.
///
/// Injected into the protocol adapter rather than living as a process
/// global, so alternative stores (shared caches, the external verifier's
/// own store) are additive.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Allocate and store a fresh code for `user`, replacing any
    /// outstanding one.
    async fn issue(&self, user: &str) -> Result<String>;

    /// Atomically remove and return the stored code for `user`.
    /// Returns `None` if no unexpired code is on record.
    async fn pop(&self, user: &str) -> Option<String>;
}

struct StoredCode {
    code: String,
    issued_at: Instant,
}

/// In-memory challenge store with per-code expiry.
pub struct InMemoryChallengeStore {
    codes: Mutex<HashMap<String, StoredCode>>,
    ttl: Duration,
}

impl InMemoryChallengeStore {
    pub fn new(ttl: Duration) -> Self {
        Self { codes: Mutex::new(HashMap::new()), ttl }
    }
}

#[async_trait]
impl ChallengeStore for InMemoryChallengeStore {
    async fn issue(&self, user: &str) -> Result<String> {
        let code = random_code();
        let mut codes = self.codes.lock().await;
        codes.insert(user.to_string(), StoredCode { code: code.clone(), issued_at: Instant::now() });
        Ok(code)
    }

    async fn pop(&self, user: &str) -> Option<String> {
        let mut codes = self.codes.lock().await;
        let stored = codes.remove(user)?;
        if stored.issued_at.elapsed() > self.ttl {
            return None;
        }
        Some(stored.code)
    }
}

fn random_code() -> String {
    let mut bytes = [0u8; CHALLENGE_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn store() -> InMemoryChallengeStore {
        InMemoryChallengeStore::new(Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_issue_then_pop() {
        let store = store();
        let code = store.issue("alice").await.unwrap();
        assert_eq!(store.pop("alice").await, Some(code));
    }

    #[tokio::test]
    async fn test_pop_once() {
        let store = store();
        let _ = store.issue("alice").await.unwrap();
        assert!(store.pop("alice").await.is_some());
        assert!(store.pop("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_pop_without_issue() {
        let store = store();
        assert!(store.pop("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_reissue_replaces_code() {
        let store = store();
        let first = store.issue("alice").await.unwrap();
        let second = store.issue("alice").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.pop("alice").await, Some(second));
        assert!(store.pop("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_not_returned() {
        let store = InMemoryChallengeStore::new(Duration::ZERO);
        let _ = store.issue("alice").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.pop("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_pop_yields_single_winner() {
        let store = Arc::new(store());
        let _ = store.issue("alice").await.unwrap();

        let a = tokio::spawn({
            let store = store.clone();
            async move { store.pop("alice").await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.pop("alice").await }
        });

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(a.is_some() as u8 + b.is_some() as u8, 1);
    }

    #[test]
    fn test_code_entropy() {
        let code = random_code();
        // 32 bytes base64url without padding
        assert_eq!(code.len(), 43);
        assert_ne!(code, random_code());
    }
}
