use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gateway_demos::{Error, RelayConfig, VerifyConfig, relay_router, verify_router};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gateway-demos",
    about = "Proof-of-concept demos: LLM gateway relay UI and Number Verification OAuth chaining."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the gateway relay UI.
    Relay {
        /// TOML file with the provider table.
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
        #[arg(long, default_value_t = 8501)]
        port: u16,
    },
    /// Serve the Google + Number Verification demo (configured via env vars).
    Verify,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Relay { config, port } => run_relay(config, port).await,
        Command::Verify => run_verify().await,
    }
}

async fn run_relay(config_path: PathBuf, port: u16) -> Result<(), Error> {
    let config = RelayConfig::load(&config_path)?;
    info!(providers = ?config.provider_keys(), "loaded provider config");

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("relay UI listening on http://0.0.0.0:{port}");
    axum::serve(listener, relay_router(config)).await?;
    Ok(())
}

async fn run_verify() -> Result<(), Error> {
    let config = VerifyConfig::from_env();
    let port = config.server_port;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("verification demo listening on http://0.0.0.0:{port}");
    info!("open that URL from the browser of the device under test");
    axum::serve(listener, verify_router(config)).await?;
    Ok(())
}
