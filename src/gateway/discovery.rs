//! Startup tool discovery.
//!
//! Runs exactly once, before the public port is bound. Any live agent is
//! equally suitable for introspection because the fleet is homogeneous, so
//! discovery connects to whichever node the directory lists first, pulls
//! the full tool listing over a transient channel, and synthesizes the
//! public registry from it. A gateway that would forward nothing is a
//! deployment error, not a degenerate-but-valid state, so an empty listing
//! aborts startup.

use std::sync::Arc;

use rmcp::ServiceExt;
use rmcp::model::Tool;
use rmcp::transport::StreamableHttpClientTransport;

use crate::cluster::NodeResolver;
use crate::error::GatewayError;
use crate::gateway::registry::{RegisteredTool, ToolRegistry};
use crate::gateway::schema::{self, CallSignature};

/// Discover the fleet's tool set and build the public registry.
pub async fn discover_tools(
    resolver: &NodeResolver,
    backend_port: u16,
) -> Result<ToolRegistry, GatewayError> {
    let endpoint = resolver.resolve_any().await?;
    let url = super::agent_url(&endpoint.ip, backend_port);
    log::info!(
        "discovering tools from agent at {url} (node '{}')",
        endpoint.node
    );

    let transport = StreamableHttpClientTransport::from_uri(url);
    let client = ()
        .serve(transport)
        .await
        .map_err(GatewayError::discovery)?;
    let listing = client.list_all_tools().await;
    let _ = client.cancel().await;

    let descriptors = listing.map_err(GatewayError::discovery)?;
    if descriptors.is_empty() {
        return Err(GatewayError::EmptyToolSet);
    }

    let mut registry = ToolRegistry::new();
    for descriptor in descriptors {
        let name = descriptor.name.to_string();
        let signature = schema::synthesize(&descriptor);
        let public = publish(descriptor, &signature);
        if registry.register(RegisteredTool {
            name: name.clone(),
            signature,
            public,
        }) {
            log::info!("registered tool: {name}");
        } else {
            log::warn!("agent listed duplicate tool '{name}'; keeping the first registration");
        }
    }

    log::info!("discovered {} tool(s) from the fleet", registry.len());
    Ok(registry)
}

/// Public descriptor for a discovered tool: same identity, same
/// documentation, the synthesized input schema in place of the agent's.
fn publish(descriptor: Tool, signature: &CallSignature) -> Tool {
    Tool {
        name: descriptor.name,
        title: descriptor.title,
        description: descriptor.description,
        input_schema: Arc::new(signature.to_input_schema()),
        output_schema: descriptor.output_schema,
        annotations: descriptor.annotations,
        icons: descriptor.icons,
        meta: descriptor.meta,
    }
}
