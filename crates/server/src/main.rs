//! cacheward server entry point.
//!
//! Boots the MCP server on stdio transport with one lifecycle controller
//! built from the layered configuration.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use cacheward_client::{ControllerConfig, FetchClient, FetchConfig, LifecycleController};
use cacheward_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let db = CacheDb::open(&config.db_path)
        .await?
        .with_max_entry_bytes(config.max_entry_bytes);
    let fetcher = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let controller = LifecycleController::new(ControllerConfig::from_app_config(&config)?, Arc::new(db), Arc::new(fetcher))?;

    tracing::info!(
        version = %controller.version(),
        origin = %controller.origin(),
        strategy = controller.strategy().as_str(),
        db_path = %config.db_path.display(),
        "Starting cacheward server on stdio transport"
    );

    let handler = handler::CachewardServer::new(Arc::new(controller));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
