//! fleetgate: an aggregating MCP gateway for a fleet of identical per-node
//! agents.
//!
//! At startup the gateway discovers the tool set from one live agent,
//! republishes every tool with an injected required `node` parameter, and
//! then forwards each call to the named node's agent after resolving its
//! address from the Kubernetes Endpoints API. The registry is fixed for
//! the lifetime of the process; per-call routing re-resolves addresses on
//! every invocation.

pub mod cli;
pub mod cluster;
pub mod error;
pub mod gateway;
