//! Error taxonomy for the gateway.
//!
//! Startup failures (`FleetUnavailable`, `EmptyToolSet`, `Discovery`) abort
//! the process before the public port is bound. Per-call failures are local
//! to the call that hit them and are reported back over MCP without touching
//! other in-flight calls or the tool registry.

use rmcp::ErrorData as McpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The endpoint directory came back empty during startup discovery.
    #[error("no endpoints available for {service}; cannot discover tools - is the agent fleet running?")]
    FleetUnavailable { service: String },

    /// Discovery reached an agent, but the agent listed no tools.
    #[error("agent listed no tools; refusing to start a gateway that forwards nothing")]
    EmptyToolSet,

    /// A call named a node with no matching directory entry.
    #[error("no endpoint found for node '{node}' in {service}")]
    NodeNotFound { node: String, service: String },

    /// A call arrived without a usable `node` argument. The published
    /// schema marks `node` required, so this is a defensive check.
    #[error("missing or non-string required argument 'node'")]
    MissingNode,

    /// A call named a tool the startup discovery never registered.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// The endpoint lookup itself failed (API server unreachable, 404, ...).
    /// Whatever the lookup service reported is surfaced unmodified.
    #[error("endpoint lookup failed: {0}")]
    Lookup(#[from] reqwest::Error),

    /// Listing tools from the agent picked for startup discovery failed.
    #[error("tool discovery failed: {reason}")]
    Discovery { reason: String },

    /// Transport or remote-side failure while forwarding a call. Opaque on
    /// purpose; the gateway does not retry.
    #[error("forwarding to node '{node}' failed: {reason}")]
    Forwarding { node: String, reason: String },

    /// A forwarded call outlived the configured per-call timeout.
    #[error("call to node '{node}' timed out after {secs}s")]
    CallTimeout { node: String, secs: u64 },
}

impl GatewayError {
    pub(crate) fn discovery(err: impl std::fmt::Display) -> Self {
        Self::Discovery {
            reason: err.to_string(),
        }
    }

    pub(crate) fn forwarding(node: &str, err: impl std::fmt::Display) -> Self {
        Self::Forwarding {
            node: node.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingNode
            | GatewayError::NodeNotFound { .. }
            | GatewayError::UnknownTool { .. } => McpError::invalid_params(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}
