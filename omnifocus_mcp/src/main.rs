use std::sync::Arc;
use tracing::{error, info};

use omnifocus_core::{
    connector::OmniFocusConnector,
    mcp_server::{JsonRpcHandler, McpServer},
    store::OmniJsStore,
    transport::StdioTransport,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging goes to stderr; stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting OmniFocus MCP server");

    let store = Arc::new(OmniJsStore::new());
    let connector = Arc::new(OmniFocusConnector::new(store));
    let server = Arc::new(McpServer::new(connector));
    let handler = JsonRpcHandler::new(server);
    let transport = StdioTransport::new(handler);

    info!("MCP server ready, listening on stdio");

    if let Err(e) = transport.run().await {
        error!("Transport error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
