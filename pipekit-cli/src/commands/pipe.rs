//! Pipe command handlers
//!
//! Starts runs from a pipe document on disk and stops running pipes.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use pipekit_client::{CallContext, PipesClient};
use pipekit_core::domain::pipe::Pipe;
use pipekit_core::dto::options::{CreateOptions, DeleteOptions};
use tracing::info;

use crate::config::Config;

/// Pipe subcommands
#[derive(Subcommand)]
pub enum PipeCommands {
    /// Start a run from a pipe JSON document
    Create {
        /// Path to the pipe JSON file
        #[arg(short, long)]
        file: String,

        /// Override the owning user id from the file
        #[arg(long)]
        user_id: Option<String>,

        /// Override the pipe id from the file
        #[arg(long)]
        pipe_id: Option<String>,

        /// Additional tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Submit directly to the in-cluster endpoint
        #[arg(long)]
        in_cluster: bool,
    },
    /// Stop a running pipe
    Stop {
        /// Owning user id
        user_id: String,

        /// Pipe id
        pipe_id: String,

        /// Run id
        run_id: String,

        /// Terminate forcefully instead of stopping gracefully
        #[arg(short, long)]
        kill: bool,

        /// Send directly to the in-cluster endpoint
        #[arg(long)]
        in_cluster: bool,
    },
}

/// Handle pipe commands
///
/// # Arguments
/// * `command` - The pipe command to execute
/// * `config` - The CLI configuration
/// * `ctx` - Context shared by every call the command makes
pub async fn handle_pipe_command(
    command: PipeCommands,
    config: &Config,
    ctx: &CallContext,
) -> Result<()> {
    let client = config.client()?;

    match command {
        PipeCommands::Create {
            file,
            user_id,
            pipe_id,
            tags,
            in_cluster,
        } => {
            let pipe = load_pipe(&file, user_id, pipe_id, tags)?;
            create_run(client.pipes(), ctx, pipe, in_cluster).await
        }
        PipeCommands::Stop {
            user_id,
            pipe_id,
            run_id,
            kill,
            in_cluster,
        } => {
            let opts = DeleteOptions {
                is_in_cluster: in_cluster,
                should_kill: kill,
            };
            stop_run(client.pipes(), ctx, &user_id, &pipe_id, &run_id, opts).await
        }
    }
}

/// Read a pipe document and apply command-line overrides
fn load_pipe(
    path: &str,
    user_id: Option<String>,
    pipe_id: Option<String>,
    tags: Vec<String>,
) -> Result<Pipe> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipe file: {}", path))?;

    let mut pipe: Pipe = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pipe file: {}", path))?;

    if let Some(user_id) = user_id {
        pipe.pipekit.user_id = user_id;
    }
    if let Some(pipe_id) = pipe_id {
        pipe.pipekit.pipe_id = pipe_id;
    }
    pipe.pipekit.tags.extend(tags);

    if pipe.user_id().is_empty() || pipe.pipe_id().is_empty() {
        anyhow::bail!("Pipe must have a user id and a pipe id (set them in the file or with --user-id/--pipe-id)");
    }

    Ok(pipe)
}

/// Start a run and display the service's view of the pipe
async fn create_run(
    pipes: &dyn PipesClient,
    ctx: &CallContext,
    mut pipe: Pipe,
    in_cluster: bool,
) -> Result<()> {
    let opts = CreateOptions {
        is_in_cluster: in_cluster,
    };
    info!(
        "Creating run for pipe {} of user {} ({})",
        pipe.pipe_id(),
        pipe.user_id(),
        opts.route()
    );

    pipes
        .create(ctx, &mut pipe, opts)
        .await
        .context("Failed to create run")?;

    println!("{}", "✓ Run created successfully!".green().bold());
    println!("  User: {}", pipe.user_id().cyan());
    println!("  Pipe: {}", pipe.pipe_id().cyan());
    if !pipe.run_id().is_empty() {
        println!("  Run:  {}", pipe.run_id().cyan().bold());
    }
    if !pipe.pipekit.tags.is_empty() {
        println!("  Tags: {}", pipe.pipekit.tags.join(", ").dimmed());
    }

    Ok(())
}

/// Stop a run
async fn stop_run(
    pipes: &dyn PipesClient,
    ctx: &CallContext,
    user_id: &str,
    pipe_id: &str,
    run_id: &str,
    opts: DeleteOptions,
) -> Result<()> {
    info!(
        "Stopping run {} of pipe {} (kill={}, {})",
        run_id,
        pipe_id,
        opts.should_kill,
        opts.route()
    );

    pipes
        .stop(ctx, user_id, pipe_id, run_id, opts)
        .await
        .context("Failed to stop run")?;

    let verb = if opts.should_kill { "killed" } else { "stopped" };
    println!(
        "{} {}",
        format!("✓ Run {}", verb).green().bold(),
        run_id.cyan()
    );

    Ok(())
}
