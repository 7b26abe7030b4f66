//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipe;

pub use pipe::PipeCommands;

use anyhow::Result;
use clap::Subcommand;
use pipekit_client::CallContext;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipe run management
    Pipe {
        #[command(subcommand)]
        command: PipeCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module. Ctrl-C cancels the
/// in-flight request through the call context.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let cancellation = CancellationToken::new();
    let ctx = CallContext::new().with_cancellation(cancellation.clone());

    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            cancellation.cancel();
        }
    });

    let result = match command {
        Commands::Pipe { command } => pipe::handle_pipe_command(command, config, &ctx).await,
    };

    watcher.abort();
    result
}
