//! The gateway core: startup discovery, signature synthesis, the tool
//! registry, and the forwarding MCP server.

pub mod discovery;
pub mod registry;
pub mod schema;
pub mod server;

pub use discovery::discover_tools;
pub use registry::{RegisteredTool, ToolRegistry};
pub use schema::{CallSignature, ParamKind, ParamSpec};
pub use server::{GatewayConfig, GatewayServer};

/// Streamable HTTP MCP endpoint of the agent on one node.
pub(crate) fn agent_url(ip: &str, backend_port: u16) -> String {
    format!("http://{ip}:{backend_port}/mcp")
}
