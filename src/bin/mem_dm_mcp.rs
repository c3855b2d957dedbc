//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes the mem-dm tools and resources over stdio. This mode is
//! designed for editor/agent integrations and shares all runtime configuration with the HTTP
//! binary.
use anyhow::{Context, Result};
use memdm::{
    config, logging,
    mcp::MemDmMcpServer,
    service::{MemoryToolService, ServiceSettings},
};
use rmcp::{service::ServiceExt, transport::stdio};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    let service = MemoryToolService::new(ServiceSettings::from_config(config))
        .context("failed to build memory tool service")?;
    let server = MemDmMcpServer::new(Arc::new(service));

    let running = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    running
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
