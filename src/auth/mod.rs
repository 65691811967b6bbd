//! # Identity Verification
//!
//! The two front-door login adapters: the Ed25519 challenge/response
//! exchange and the OAuth2 authorization-code flow. Both produce a verified
//! identity whose secret is handed to the credential exchange client.

mod challenge;
mod oauth;
mod verifier;

pub use challenge::{ChallengeStore, InMemoryChallengeStore};
pub use oauth::{OAuthClient, STATE_COOKIE};
pub use verifier::{HttpKeyVerifier, SignatureVerifier};
