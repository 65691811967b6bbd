//! # Command-Line Interface
//!
//! Two entry points: `server` runs the gateway, `client` drives the
//! challenge/response flow against a running gateway and saves the returned
//! credentials locally.

mod client;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::api::{start_server, ApiState};
use crate::auth::{ChallengeStore, HttpKeyVerifier, InMemoryChallengeStore, OAuthClient, SignatureVerifier};
use crate::config::AppConfig;
use crate::errors::{Error, Result};
use crate::observability::init_logging;
use crate::secrets::{CredentialExchange, LoginRegistry};

pub use client::{run_client, ClientOptions};

#[derive(Debug, Parser)]
#[command(name = "credgate", version, about = "Credential exchange gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the gateway server
    Server(ServerArgs),
    /// Log in to a running gateway and save the issued credentials
    Client(ClientArgs),
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Configuration file (TOML/YAML/JSON); `CREDGATE_*` variables override
    #[arg(short, long)]
    pub config: Option<String>,

    /// Listener address override, `host:port`
    #[arg(short, long)]
    pub listener: Option<String>,

    /// Log level override
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Gateway endpoint, e.g. http://localhost:18080
    #[arg(short, long)]
    pub endpoint: String,

    /// Auth route name on the gateway
    #[arg(short, long, default_value = "stns")]
    pub auth_type: String,

    /// Username registered with the identity endpoint
    #[arg(short, long)]
    pub user: String,

    /// Provider token to exchange (e.g. a GitHub personal access token)
    #[arg(short, long)]
    pub token: String,

    /// Ed25519 private key file (PKCS#8, PEM or DER)
    #[arg(short = 'p', long, default_value = "~/.ssh/id_ed25519.p8")]
    pub privatekey: String,

    /// Directory the token and certificates are written into
    #[arg(short, long, default_value = "~/.credgate")]
    pub save_path: String,
}

impl From<ClientArgs> for ClientOptions {
    fn from(args: ClientArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            auth_type: args.auth_type,
            user: args.user,
            token: args.token,
            key_path: args.privatekey,
            save_path: args.save_path,
        }
    }
}

/// Load configuration, wire the components together and run the server
/// until a shutdown signal arrives.
pub async fn run_server(args: ServerArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(listener) = args.listener {
        config.server.listener = listener;
    }
    if let Some(level) = args.log_level {
        config.log.level = level;
    }
    config.validate()?;

    // Held until shutdown so file-backed log lines flush.
    let _log_guard = init_logging(&config.log)?;
    info!(version = env!("CARGO_PKG_VERSION"), "credgate starting");

    if let Some(pid_file) = &config.server.pid_file {
        std::fs::write(pid_file, std::process::id().to_string())
            .map_err(|e| Error::io_context(e, format!("cannot write pid file {}", pid_file)))?;
    }

    let registry = LoginRegistry::from_config(&config)?;
    let exchange = Arc::new(CredentialExchange::new(config.vault.clone(), registry)?);
    let challenges: Arc<dyn ChallengeStore> =
        Arc::new(InMemoryChallengeStore::new(config.verifier.challenge_ttl()));
    let verifier: Arc<dyn SignatureVerifier> =
        Arc::new(HttpKeyVerifier::new(config.verifier.endpoint.clone(), reqwest::Client::new()));
    let oauth = Arc::new(OAuthClient::new(config.oauth.clone(), reqwest::Client::new()));

    let config = Arc::new(config);
    let state = ApiState { config: config.clone(), challenges, verifier, oauth, exchange };

    start_server(&config, state).await
}
