//! Pipekit CLI
//!
//! Command-line interface for starting and stopping pipe runs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use pipekit_client::{DEFAULT_BASE_URI, DEFAULT_CLUSTER_BASE_URI};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipekit")]
#[command(about = "Pipekit workflow CLI", long_about = None)]
struct Cli {
    /// Hosted Pipekit API base URI
    #[arg(long, env = "PIPEKIT_BASE_URI", default_value = DEFAULT_BASE_URI, global = true)]
    base_uri: String,

    /// In-cluster execution API base URI
    #[arg(
        long,
        env = "PIPEKIT_CLUSTER_BASE_URI",
        default_value = DEFAULT_CLUSTER_BASE_URI,
        global = true
    )]
    cluster_base_uri: String,

    /// Authorization token
    #[arg(long, env = "PIPEKIT_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "PIPEKIT_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipekit=info,pipekit_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        base_uri: cli.base_uri,
        cluster_base_uri: cli.cluster_base_uri,
        token: cli.token,
        timeout_secs: cli.timeout,
    };

    handle_command(cli.command, &config).await
}
