//! Dispatch table from tool names and resource URIs to handler functions.

use std::{collections::BTreeMap, future::Future, pin::Pin};

use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ReadResourceRequestParam, ReadResourceResult,
};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, McpError>> + Send>>;

/// Handler signature shared by tools and resources; `S` is the server state.
pub type Handler<S, P, R> = fn(&S, P) -> BoxFuture<R>;

pub(crate) struct Registry<S> {
    tools: BTreeMap<&'static str, Handler<S, CallToolRequestParam, CallToolResult>>,
    resources: BTreeMap<&'static str, Handler<S, ReadResourceRequestParam, ReadResourceResult>>,
}

impl<S> Registry<S> {
    pub(crate) fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    pub(crate) fn tool(
        mut self,
        name: &'static str,
        handler: Handler<S, CallToolRequestParam, CallToolResult>,
    ) -> Self {
        self.tools.insert(name, handler);
        self
    }

    pub(crate) fn resource(
        mut self,
        uri: &'static str,
        handler: Handler<S, ReadResourceRequestParam, ReadResourceResult>,
    ) -> Self {
        self.resources.insert(uri, handler);
        self
    }

    /// Run the tool named in `request`, or fail with `invalid_params`.
    pub(crate) fn call_tool(
        &self,
        state: &S,
        request: CallToolRequestParam,
    ) -> BoxFuture<CallToolResult> {
        match self.tools.get(request.name.as_ref()) {
            Some(handler) => handler(state, request),
            None => {
                let message = format!("Unknown tool: {}", request.name);
                Box::pin(async move { Err(McpError::invalid_params(message, None)) })
            }
        }
    }

    /// Read the resource at `request.uri`, or fail with `invalid_params`.
    pub(crate) fn read_resource(
        &self,
        state: &S,
        request: ReadResourceRequestParam,
    ) -> BoxFuture<ReadResourceResult> {
        match self.resources.get(request.uri.as_str()) {
            Some(handler) => handler(state, request),
            None => {
                let message = format!("Unknown resource URI: {}", request.uri);
                Box::pin(async move { Err(McpError::invalid_params(message, None)) })
            }
        }
    }

    pub(crate) fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }
}
