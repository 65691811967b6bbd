use clap::Parser;

use credgate::cli::{run_client, run_server, Cli, Commands};
use credgate::config::LogConfig;
use credgate::observability::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env for local development; ignore a missing file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.command {
        Commands::Server(args) => run_server(args).await?,
        Commands::Client(args) => {
            let _guard = init_logging(&LogConfig::default())?;
            run_client(&args.into()).await?;
        }
    }
    Ok(())
}
