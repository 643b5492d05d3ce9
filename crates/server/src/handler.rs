//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the lifecycle controller.
use std::sync::Arc;

use cacheward_client::LifecycleController;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

use crate::tools::cache::{CacheFetchParams, activate_impl, fetch_impl, install_impl, status_impl};

/// The main MCP server handler for cacheward.
#[derive(Clone)]
pub struct CachewardServer {
    controller: Arc<LifecycleController>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl CachewardServer {
    /// Create a new server handler around a controller.
    pub fn new(controller: Arc<LifecycleController>) -> Self {
        Self { controller, tool_router: Self::tool_router() }
    }

    /// Populate the current cache version from the asset manifest.
    #[tool(
        description = "Fetch every manifest asset and store it under the current cache version. Returns per-asset failures; partial failure is not an error."
    )]
    async fn cache_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.controller).await
    }

    /// Delete stale cache versions and start intercepting requests.
    #[tool(description = "Delete every cache version except the current one and take control of subsequent requests.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.controller).await
    }

    /// Run one request through the interceptor.
    #[tool(
        description = "Fetch a URL through the cache proxy. Returns status, headers, body text and where the response came from (network, cache, root-document, offline, passthrough)."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.controller, params.0).await
    }

    /// Report version, lifecycle state and stored namespaces.
    #[tool(description = "Show the current cache version, lifecycle state, strategy and stored cache versions.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.controller).await
    }
}

impl ServerHandler for CachewardServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "cacheward".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
