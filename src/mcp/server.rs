//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{health_payload, json_resource_contents, serialize_json},
        handlers::{
            add::handle_add_memory, placeholder::handle_placeholder,
            retrieve::handle_retrieve_memory,
        },
        registry::{BoxFuture, Registry},
        schemas,
    },
    service::{MemoryToolService, ToolApi},
    tools::{
        ADD_MEMORY_TOOL, AddMemoryRequest, PLACEHOLDER_TOOL, RETRIEVE_MEMORY_TOOL,
        RetrieveMemoryRequest,
    },
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourcesResult,
        ListToolsResult, RawResource, ReadResourceRequestParam, ReadResourceResult, Resource,
        ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};
use tracing::Instrument;

const HEALTH_URI: &str = "mcp://mem-dm/health";
const METRICS_URI: &str = "mcp://mem-dm/metrics";

/// MCP server implementation exposing the mem-dm tools.
#[derive(Clone)]
pub struct MemDmMcpServer {
    service: Arc<MemoryToolService>,
    registry: Arc<Registry<MemDmMcpServer>>,
}

impl MemDmMcpServer {
    /// Create a new MCP server backed by the supplied tool service.
    pub fn new(service: Arc<MemoryToolService>) -> Self {
        let registry = Registry::new()
            .resource(HEALTH_URI, resource_health)
            .resource(METRICS_URI, resource_metrics)
            .tool(ADD_MEMORY_TOOL, tool_add_memory)
            .tool(RETRIEVE_MEMORY_TOOL, tool_retrieve_memory)
            .tool(PLACEHOLDER_TOOL, tool_placeholder);
        tracing::debug!(
            tools = ?registry.tool_names().collect::<Vec<_>>(),
            "Registered MCP tools"
        );

        Self {
            service,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        vec![
            Tool {
                name: Cow::Borrowed(RETRIEVE_MEMORY_TOOL),
                title: Some("Retrieve Memory".to_string()),
                description: Some(Cow::Borrowed(
                    "Search a user's stored memories; returns trimmed records plus graph relations.",
                )),
                input_schema: Arc::new(schemas::input_schema::<RetrieveMemoryRequest>()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Retrieve Memory")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(ADD_MEMORY_TOOL),
                title: Some("Add Memory".to_string()),
                description: Some(Cow::Borrowed(
                    "Queue a piece of conversation for background ingestion into the user's memory.",
                )),
                input_schema: Arc::new(schemas::input_schema::<AddMemoryRequest>()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("Add Memory")
                        .destructive(false)
                        .idempotent(false)
                        .open_world(true),
                ),
                icons: None,
            },
            Tool {
                name: Cow::Borrowed(PLACEHOLDER_TOOL),
                title: Some("mem-dm".to_string()),
                description: Some(Cow::Borrowed(
                    "Usage hint; call mem_dm_add_memory or mem_dm_retrieve_memory instead.",
                )),
                input_schema: Arc::new(schemas::empty_object_schema()),
                output_schema: None,
                annotations: Some(
                    ToolAnnotations::with_title("mem-dm")
                        .read_only(true)
                        .idempotent(true)
                        .open_world(false),
                ),
                icons: None,
            },
        ]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut health = RawResource::new(HEALTH_URI, "health");
        health.description =
            Some("Configured and resolved memory service base URL, cache age, retry settings".into());

        let mut metrics = RawResource::new(METRICS_URI, "metrics");
        metrics.description = Some("Tool invocation, retry, and failure counters".into());

        vec![health.no_annotation(), metrics.no_annotation()]
    }
}

fn resource_health(
    server: &MemDmMcpServer,
    _request: ReadResourceRequestParam,
) -> BoxFuture<ReadResourceResult> {
    let service = server.service.clone();
    Box::pin(async move {
        let health = service.health().await;
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                HEALTH_URI,
                health_payload(&health, service.settings()),
            )],
        })
    })
}

fn resource_metrics(
    server: &MemDmMcpServer,
    _request: ReadResourceRequestParam,
) -> BoxFuture<ReadResourceResult> {
    let service = server.service.clone();
    Box::pin(async move {
        let snapshot = service.metrics_snapshot();
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                METRICS_URI,
                serialize_json(&snapshot, METRICS_URI),
            )],
        })
    })
}

fn tool_add_memory(server: &MemDmMcpServer, request: CallToolRequestParam) -> BoxFuture<CallToolResult> {
    let service = server.service.clone();
    Box::pin(async move { handle_add_memory(&service, request.arguments).await })
}

fn tool_retrieve_memory(
    server: &MemDmMcpServer,
    request: CallToolRequestParam,
) -> BoxFuture<CallToolResult> {
    let service = server.service.clone();
    Box::pin(async move { handle_retrieve_memory(&service, request.arguments).await })
}

fn tool_placeholder(
    server: &MemDmMcpServer,
    _request: CallToolRequestParam,
) -> BoxFuture<CallToolResult> {
    let service = server.service.clone();
    Box::pin(async move { handle_placeholder(&service).await })
}

impl ServerHandler for MemDmMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "mem-dm".to_string();
        implementation.title = Some("mem-dm Memory Tools".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use mem_dm_add_memory to store what a user said and mem_dm_retrieve_memory to recall relevant memories before answering. Both tools require user_id.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        self.registry.read_resource(self, request)
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let span = tracing::debug_span!("mcp_tool", tool = %request.name);
        self.registry
            .call_tool(self, request)
            .instrument(span)
    }
}
