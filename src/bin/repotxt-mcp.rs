/*!
 * MCP stdio server for repotxt
 *
 * stdout carries JSON-RPC frames; all diagnostics go to stderr.
 */

use anyhow::{Context, Result};
use rmcp::{transport::stdio, ServiceExt};

use repotxt::config::ServerConfig;
use repotxt::logging::init_tracing;
use repotxt::server::RepoTxtServer;

#[tokio::main]
async fn main() -> Result<()> {
    let verbose = std::env::args().any(|arg| arg == "--verbose" || arg == "-v");
    init_tracing(verbose).context("failed to initialize logging")?;

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    tracing::info!(?config, "Starting MCP server on stdio");

    let running = RepoTxtServer::new(config)
        .serve(stdio())
        .await
        .context("failed to start stdio MCP server")?;
    running
        .waiting()
        .await
        .context("stdio MCP server task join failed")?;

    Ok(())
}
