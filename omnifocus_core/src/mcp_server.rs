// src/mcp_server.rs
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::OmniFocusError;
use crate::Connector;
use rmcp::model::*;

/// MCP server wrapping a single connector.
pub struct McpServer {
    connector: Arc<dyn Connector>,
}

impl McpServer {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    pub async fn handle_initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, OmniFocusError> {
        info!(server = self.connector.name(), "MCP server initializing");
        self.connector.initialize(request).await
    }

    pub async fn handle_list_resources(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, OmniFocusError> {
        self.connector.list_resources(request).await
    }

    pub async fn handle_read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, OmniFocusError> {
        let contents = self.connector.read_resource(request).await?;
        Ok(ReadResourceResult { contents })
    }

    pub async fn handle_list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, OmniFocusError> {
        self.connector.list_tools(request).await
    }

    pub async fn handle_call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, OmniFocusError> {
        debug!(tool = request.name.as_ref(), "tool call");
        self.connector.call_tool(request).await
    }
}

/// JSON-RPC 2.0 handler over the MCP server. Takes a raw request Value and
/// produces a response Value; notifications produce no response.
pub struct JsonRpcHandler {
    server: Arc<McpServer>,
}

impl JsonRpcHandler {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self { server }
    }

    /// Handle one JSON-RPC message. Returns None for notifications (no id).
    pub async fn handle_request(&self, request: Value) -> Option<Value> {
        let id = request.get("id").cloned();
        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or(json!({}));
        debug!(method, "JSON-RPC request");

        // Notifications carry no id and get no response.
        if id.is_none() {
            return None;
        }

        let result = match method {
            "initialize" => match serde_json::from_value::<InitializeRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_initialize(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(OmniFocusError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(OmniFocusError::SerdeJson(e).to_jsonrpc_error()),
            },
            "ping" => Ok(json!({})),
            "resources/list" => {
                match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                    Ok(req) => self
                        .server
                        .handle_list_resources(req)
                        .await
                        .and_then(|r| serde_json::to_value(r).map_err(OmniFocusError::SerdeJson))
                        .map_err(|e| e.to_jsonrpc_error()),
                    Err(e) => Err(OmniFocusError::SerdeJson(e).to_jsonrpc_error()),
                }
            }
            "resources/read" => match serde_json::from_value::<ReadResourceRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_read_resource(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(OmniFocusError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(OmniFocusError::SerdeJson(e).to_jsonrpc_error()),
            },
            "tools/list" => match serde_json::from_value::<Option<PaginatedRequestParam>>(params) {
                Ok(req) => self
                    .server
                    .handle_list_tools(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(OmniFocusError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(OmniFocusError::SerdeJson(e).to_jsonrpc_error()),
            },
            "tools/call" => match serde_json::from_value::<CallToolRequestParam>(params) {
                Ok(req) => self
                    .server
                    .handle_call_tool(req)
                    .await
                    .and_then(|r| serde_json::to_value(r).map_err(OmniFocusError::SerdeJson))
                    .map_err(|e| e.to_jsonrpc_error()),
                Err(e) => Err(OmniFocusError::SerdeJson(e).to_jsonrpc_error()),
            },
            _ => Err(OmniFocusError::MethodNotFound.to_jsonrpc_error()),
        };

        Some(match result {
            Ok(result) => json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": id,
            }),
            Err(error) => json!({
                "jsonrpc": "2.0",
                "error": error,
                "id": id,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::OmniFocusConnector;
    use crate::store::MemoryStore;

    fn handler() -> JsonRpcHandler {
        let store = Arc::new(MemoryStore::new());
        let connector = Arc::new(OmniFocusConnector::new(store));
        JsonRpcHandler::new(Arc::new(McpServer::new(connector)))
    }

    #[tokio::test]
    async fn initialize_roundtrip() {
        let h = handler();
        let response = h
            .handle_request(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2025-06-18",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "0.0.0"}
                }
            }))
            .await
            .unwrap();
        assert_eq!(response["id"], json!(1));
        assert_eq!(response["result"]["serverInfo"]["name"], json!("omnifocus"));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let h = handler();
        let response = h
            .handle_request(json!({
                "jsonrpc": "2.0",
                "method": "notifications/initialized"
            }))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let h = handler();
        let response = h
            .handle_request(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "no/such/method"
            }))
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn tools_list_over_jsonrpc() {
        let h = handler();
        let response = h
            .handle_request(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/list"
            }))
            .await
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 29);
    }
}
