// src/lib.rs
pub mod connector;
pub mod error;
pub mod mcp_server;
pub mod model;
pub mod ops;
pub mod osa;
pub mod outcome;
pub mod resolver;
pub mod store;
pub mod transport;

// Re-export the rmcp model types that callers of this library need.
pub use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
    InitializeResult, ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
    RawResource, ReadResourceRequestParam, Resource, ResourceContents, ServerCapabilities, Tool,
};

use async_trait::async_trait;

use crate::error::OmniFocusError;

/// An MCP server backend: advertises tools and resources and services the
/// corresponding requests. The JSON-RPC handler talks to this trait only.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Unique name, used as the MCP server name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn capabilities(&self) -> ServerCapabilities;

    async fn initialize(
        &self,
        request: InitializeRequestParam,
    ) -> Result<InitializeResult, OmniFocusError>;

    async fn list_resources(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, OmniFocusError>;

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<Vec<ResourceContents>, OmniFocusError>;

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, OmniFocusError>;

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, OmniFocusError>;
}
