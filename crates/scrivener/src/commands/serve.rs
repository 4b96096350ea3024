//! Serve command: run the MCP server on stdio.

use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use rmcp::ServiceExt;
use scrivener_core::{AnalyzerBuilder, Config};
use tracing::{info, instrument};

use crate::server::ProjectServer;

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Start in offline mode regardless of configuration.
    #[arg(long)]
    pub offline: bool,
}

/// Serve analysis tools over MCP until the client disconnects.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(
    args: ServeArgs,
    max_input: Option<usize>,
    config: Config,
) -> anyhow::Result<()> {
    let mut builder = AnalyzerBuilder::from_config(&config).context("failed to build analyzer")?;
    if args.offline {
        let mut settings = config.analysis.clone();
        settings.work_offline = true;
        builder = builder.settings(settings);
    }
    let server = ProjectServer::new(Arc::new(builder.build()), max_input);

    info!("starting MCP server on stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP server")?;
    let reason = service
        .waiting()
        .await
        .context("MCP server task failed")?;
    info!(reason = ?reason, "MCP server stopped");
    Ok(())
}
