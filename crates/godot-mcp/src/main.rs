use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use godot_mcp::config::ServerConfig;
use godot_mcp::tools::GodotMcp;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "godot-mcp", about = "MCP server for GDScript editing in a Godot project")]
struct Args {
    /// Godot project directory every tool path is resolved against
    #[arg(long, env = "GODOT_PROJECT_ROOT")]
    project_root: PathBuf,

    /// Log filter, e.g. "info" or "godot_mcp=debug" (logs go to stderr)
    #[arg(long, env = "GODOT_MCP_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the protocol.
    let filter = EnvFilter::try_new(&args.log_level)
        .with_context(|| format!("Invalid log filter: {}", args.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::from_root(&args.project_root)?;
    tracing::info!(root = %config.project_root().display(), "starting godot-mcp");

    let service = GodotMcp::new(config)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to start server"))?;
    let reason = service.waiting().await?;
    tracing::info!(?reason, "server stopped");
    Ok(())
}
