//! The forwarding MCP server.
//!
//! Serves the registry built at startup and forwards each tool call to the
//! node named by the call's `node` argument. Every call owns its own
//! transient channel to the agent and its own argument map, and the
//! registry is read-only, so concurrent calls share no mutable state.

use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
        Implementation, JsonObject, ListPromptsResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ReadResourceRequestParam, ReadResourceResult, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    transport::StreamableHttpClientTransport,
};
use tokio::sync::Semaphore;

use crate::cluster::NodeResolver;
use crate::error::GatewayError;
use crate::gateway::registry::ToolRegistry;
use crate::gateway::schema::NODE_PARAM;

/// Per-call forwarding limits.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port every per-node agent listens on.
    pub backend_port: u16,
    /// Wall-clock budget for one forwarded call (resolve + connect + call).
    pub call_timeout: Duration,
    /// Upper bound on concurrently forwarded calls.
    pub max_inflight: usize,
}

#[derive(Clone)]
pub struct GatewayServer {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ToolRegistry,
    resolver: NodeResolver,
    config: GatewayConfig,
    inflight: Semaphore,
}

impl GatewayServer {
    pub fn new(registry: ToolRegistry, resolver: NodeResolver, config: GatewayConfig) -> Self {
        let inflight = Semaphore::new(config.max_inflight);
        Self {
            inner: Arc::new(Inner {
                registry,
                resolver,
                config,
                inflight,
            }),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.inner.registry
    }

    /// Forward one tool call to the node named in `arguments`.
    ///
    /// The `node` entry is stripped before forwarding; the agent sees
    /// exactly the remaining arguments under the original tool name.
    pub async fn dispatch(
        &self,
        tool: &str,
        mut arguments: JsonObject,
    ) -> Result<CallToolResult, GatewayError> {
        if !self.inner.registry.contains(tool) {
            return Err(GatewayError::UnknownTool {
                name: tool.to_string(),
            });
        }
        let node = take_node(&mut arguments)?;
        log::debug!("forwarding '{tool}' to node '{node}'");

        let _permit = self
            .inner
            .inflight
            .acquire()
            .await
            .map_err(|err| GatewayError::forwarding(&node, err))?;

        let timeout = self.inner.config.call_timeout;
        tokio::time::timeout(timeout, self.forward(tool, &node, arguments))
            .await
            .unwrap_or_else(|_| {
                Err(GatewayError::CallTimeout {
                    node: node.clone(),
                    secs: timeout.as_secs(),
                })
            })
    }

    async fn forward(
        &self,
        tool: &str,
        node: &str,
        arguments: JsonObject,
    ) -> Result<CallToolResult, GatewayError> {
        let endpoint = self.inner.resolver.resolve(node).await?;
        let url = super::agent_url(&endpoint.ip, self.inner.config.backend_port);

        let transport = StreamableHttpClientTransport::from_uri(url);
        let client = ()
            .serve(transport)
            .await
            .map_err(|err| GatewayError::forwarding(node, err))?;
        let outcome = client
            .call_tool(CallToolRequestParam {
                name: tool.to_string().into(),
                arguments: Some(arguments),
            })
            .await;
        let _ = client.cancel().await;

        let result = outcome.map_err(|err| GatewayError::forwarding(node, err))?;
        Ok(unwrap_result(result))
    }
}

/// Remove and return the `node` argument.
fn take_node(arguments: &mut JsonObject) -> Result<String, GatewayError> {
    match arguments.remove(NODE_PARAM) {
        Some(serde_json::Value::String(node)) => Ok(node),
        _ => Err(GatewayError::MissingNode),
    }
}

/// Unwrap an agent's result: structured content wins, otherwise the first
/// textual content item. Agent-side tool errors pass through untouched.
fn unwrap_result(result: CallToolResult) -> CallToolResult {
    if result.is_error == Some(true) {
        return result;
    }
    if let Some(value) = result.structured_content {
        return CallToolResult::structured(value);
    }
    let text = result
        .content
        .into_iter()
        .find_map(|item| item.as_text().map(|text| text.text.clone()));
    match text {
        Some(text) => CallToolResult::success(vec![Content::text(text)]),
        None => {
            log::warn!("agent returned neither structured content nor text");
            CallToolResult::success(Vec::new())
        }
    }
}

impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Aggregating gateway for a fleet of per-node agents. Every tool takes a \
                 leading 'node' parameter naming the target node."
                    .to_string(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        self.dispatch(&request.name, arguments)
            .await
            .map_err(|err| {
                log::debug!("call to '{}' failed: {err}", request.name);
                err.into()
            })
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(
            self.inner.registry.public_tools(),
        ))
    }

    async fn get_prompt(
        &self,
        _request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        Err(McpError::invalid_request(
            "Prompts are not supported; the gateway forwards tools only",
            None,
        ))
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            prompts: vec![],
            next_cursor: None,
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult {
            resources: vec![],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        _request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        Err(McpError::invalid_request(
            "Resources are not supported; the gateway forwards tools only",
            None,
        ))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult {
            next_cursor: None,
            resource_templates: Vec::new(),
        })
    }
}
