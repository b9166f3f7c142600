//! MCP server handler implementation.
//!
//! This module defines the host that owns the worker registration and routes
//! tool calls to the appropriate implementations.

use std::sync::Arc;

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
use url::Url;
use wahlinfo_client::FetchClient;
use wahlinfo_core::reminders::Notifier;
use wahlinfo_core::request::canonicalize;
use wahlinfo_core::worker::{Registration, UpdateOutcome};
use wahlinfo_core::{AppConfig, CacheDb, Error};

use crate::tools::{
    CacheKeysParams, CachePurgeParams, HostWorker, SwFetchParams, SwMessageParams, SwPushParams, SwUpdateParams,
    fetch_impl, keys_impl, message_impl, purge_impl, push_impl, status_impl, update_impl,
};

/// Controller generation served by this binary.
pub type Worker = HostWorker<FetchClient>;

/// The MCP host for the offline cache controller.
#[derive(Clone)]
pub struct ServiceWorkerHost {
    config: AppConfig,
    origin: Url,
    db: CacheDb,
    network: FetchClient,
    notifier: Arc<dyn Notifier>,
    registration: Arc<Registration<Worker>>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ServiceWorkerHost {
    /// Create a new host with no registered generation.
    pub fn new(
        config: AppConfig, db: CacheDb, network: FetchClient, notifier: Arc<dyn Notifier>,
    ) -> Result<Self, Error> {
        let origin = canonicalize(&config.app_origin, None)?;
        Ok(Self {
            config,
            origin,
            db,
            network,
            notifier,
            registration: Arc::new(Registration::new()),
            tool_router: Self::tool_router(),
        })
    }

    pub fn registration(&self) -> Arc<Registration<Worker>> {
        Arc::clone(&self.registration)
    }

    /// Install (and if possible activate) the configured version.
    pub async fn register_configured(&self) -> Result<UpdateOutcome, Error> {
        let worker = Worker::from_app(&self.config, self.db.clone(), self.network.clone(), Arc::clone(&self.notifier))?;
        self.registration.register(worker).await
    }

    /// Route one request through the active controller.
    #[tool(
        description = "Route a request through the offline cache controller. \
                       Returns the request class, how it was answered, status, headers and body."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.registration, &self.network, &self.origin, params.0).await
    }

    #[tool(
        description = "Post a client message to the worker: CHECK_REMINDERS, SYNC_REMINDERS, \
                       SKIP_WAITING, GET_VERSION or CLEAR_RUNTIME_CACHE."
    )]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.registration, params.0).await
    }

    #[tool(description = "Deliver a push message to the active worker and return the notification it shows.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.registration, params.0).await
    }

    /// Register a new build.
    ///
    /// Installs the new version next to the active one; it activates right
    /// away only when skip-waiting applies.
    #[tool(description = "Install a new worker version. Activates at once with skip_waiting, otherwise waits.")]
    async fn sw_update(&self, params: Parameters<SwUpdateParams>) -> Result<CallToolResult, McpError> {
        let notifier = Arc::clone(&self.notifier);
        update_impl(&self.registration, &self.config, &self.db, &self.network, notifier, params.0).await
    }

    #[tool(description = "Show the active and waiting worker generations and every cache store with its entry count.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.registration, &self.db).await
    }

    #[tool(description = "List the request keys held by a cache store.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.db, params.0).await
    }

    #[tool(description = "Delete a named cache store, or every store not owned by the active worker (stale=true).")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.registration, &self.db, params.0).await
    }
}

impl ServerHandler for ServiceWorkerHost {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "wahlinfo-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline cache controller of the Wahl-Info app. \
                 Use sw_fetch to route requests and sw_status to inspect stores."
                    .into(),
            ),
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
