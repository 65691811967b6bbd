//! # Secrets Backend Integration
//!
//! Credential exchange (verified identity → Vault session) and the
//! certificate issuance pipeline on top of it.

pub mod login;
mod pki;
mod vault;

pub use login::{BackendLogin, GithubLogin, LoginRegistry};
pub use pki::{issue_all, CertBundle};
pub use vault::{CredentialExchange, VaultSession};
