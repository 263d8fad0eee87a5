//! MCP server handler implementation.
//!
//! Each worker event is exposed as one tool. Every call builds a fresh
//! worker over the shared cache store and returns what the worker asked
//! the host to do.
use crate::state::AppState;
use crate::tools::cache::{CacheInspectParams, inspect_impl};
use crate::tools::fetch::{WorkerFetchParams, fetch_impl};
use crate::tools::lifecycle::{LifecycleParams, activate_impl, install_impl};
use crate::tools::message::{WorkerMessageParams, message_impl};
use crate::tools::notify::{WorkerClickParams, WorkerPushParams, click_impl, push_impl};
use crate::tools::sync::{WorkerSyncParams, sync_impl};

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

/// The main MCP server handler for offgrid.
#[derive(Clone)]
pub struct OffgridServer {
    tool_router: ToolRouter<Self>,
    state: AppState,
}

#[tool_router]
impl OffgridServer {
    /// Create a new server handler.
    pub fn new(state: AppState) -> Self {
        Self { tool_router: Self::tool_router(), state }
    }

    /// Precache the static asset list into this version's static partition.
    #[tool(
        description = "Install event: precache every static asset into the current static partition. Fails without storing anything if any asset fails."
    )]
    async fn worker_install(&self, _params: Parameters<LifecycleParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.state).await
    }

    #[tool(
        description = "Activate event: delete partitions of other versions, open the current ones, and claim open pages."
    )]
    async fn worker_activate(&self, _params: Parameters<LifecycleParams>) -> Result<CallToolResult, McpError> {
        activate_impl(&self.state).await
    }

    /// Route one intercepted request through the caching policy.
    #[tool(
        description = "Fetch event: answer a request from cache, network, or an offline fallback. Returns passthrough=true when the worker does not handle it."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.state, params.0).await
    }

    #[tool(description = "Message event: SKIP_WAITING, CACHE_URLS (payload: list of URLs), or GET_VERSION.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.state, params.0).await
    }

    #[tool(description = "Push event: build and show a notification from the push data.")]
    async fn worker_push(&self, params: Parameters<WorkerPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.state, params.0).await
    }

    #[tool(
        description = "Notification click event: close the notification and focus or open a window on its target URL."
    )]
    async fn worker_notification_click(
        &self, params: Parameters<WorkerClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.state, params.0).await
    }

    #[tool(description = "Background sync event.")]
    async fn worker_sync(&self, params: Parameters<WorkerSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.state, params.0).await
    }

    /// List cache partitions and, optionally, the request identities stored in one.
    #[tool(description = "Inspect cache partitions, their entry counts, and optionally one partition's stored requests.")]
    async fn cache_inspect(
        &self, params: Parameters<CacheInspectParams>,
    ) -> Result<CallToolResult, McpError> {
        inspect_impl(&self.state, params.0).await
    }
}

impl ServerHandler for OffgridServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offgrid".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Offline-first caching worker, version {}. Deliver worker events as tool calls and apply the returned effects.",
                self.state.config.version
            )),
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
