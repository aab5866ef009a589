//! The `trustvote` command line client.

mod app;
mod commands;
mod election_file;
mod render;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use trustvote_client::config::{from_toml_path, ClientConfig};

use crate::app::App;
use crate::commands::Commands;

/// Create, vote in and follow TrustVote elections.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the client configuration.
    #[arg(long, short, default_value = "trustvote.toml")]
    config: PathBuf,
    /// Private key of the wallet to act as. Without it, only read-only commands work.
    #[arg(long, env = "TRUSTVOTE_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global default subscriber")?;

    let cli = Cli::parse();
    tracing::debug!("Reading client config from {:?}", cli.config);
    let config: ClientConfig =
        from_toml_path(&cli.config).context("Failed to read client configuration")?;

    let app = App::new(config, cli.private_key.as_deref())?;
    cli.command.run(&app).await
}
