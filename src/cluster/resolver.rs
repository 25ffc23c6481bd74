//! Node name to address resolution.
//!
//! Selection is by node name, the identity operators reason about, never by
//! raw address. Every resolution re-lists the directory, so address churn
//! from agent restarts or rescheduling needs no watch machinery: the next
//! call simply sees the new listing.

use std::sync::Arc;

use crate::cluster::directory::{Directory, NodeEndpoint};
use crate::error::GatewayError;

#[derive(Clone)]
pub struct NodeResolver {
    directory: Arc<dyn Directory>,
    service: String,
}

impl NodeResolver {
    /// `service` is the looked-up Service name, used only in error messages.
    pub fn new(directory: Arc<dyn Directory>, service: impl Into<String>) -> Self {
        Self {
            directory,
            service: service.into(),
        }
    }

    /// Address of the named node: first directory entry whose node name
    /// matches exactly. `NodeNotFound` when nothing matches.
    pub async fn resolve(&self, node: &str) -> Result<NodeEndpoint, GatewayError> {
        let entries = self.directory.list().await?;
        entries
            .into_iter()
            .find(|entry| entry.node == node)
            .ok_or_else(|| GatewayError::NodeNotFound {
                node: node.to_string(),
                service: self.service.clone(),
            })
    }

    /// Address of an arbitrary live agent (first listed). Only used for
    /// startup discovery, where every agent declares the same tool set.
    pub async fn resolve_any(&self) -> Result<NodeEndpoint, GatewayError> {
        let mut entries = self.directory.list().await?;
        if entries.is_empty() {
            return Err(GatewayError::FleetUnavailable {
                service: self.service.clone(),
            });
        }
        Ok(entries.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticFleet(Vec<NodeEndpoint>);

    #[async_trait]
    impl Directory for StaticFleet {
        async fn list(&self) -> Result<Vec<NodeEndpoint>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    fn fleet(entries: &[(&str, &str)]) -> NodeResolver {
        let entries = entries
            .iter()
            .map(|(node, ip)| NodeEndpoint {
                node: node.to_string(),
                ip: ip.to_string(),
            })
            .collect();
        NodeResolver::new(Arc::new(StaticFleet(entries)), "backend-mcp-service")
    }

    #[tokio::test]
    async fn test_resolve_exact_match() {
        let resolver = fleet(&[("node-a", "10.0.0.1"), ("node-b", "10.0.0.2")]);
        let endpoint = resolver.resolve("node-b").await.expect("node-b resolves");
        assert_eq!(endpoint.ip, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_for_unchanged_listing() {
        let resolver = fleet(&[("node-a", "10.0.0.1"), ("node-b", "10.0.0.2")]);
        let first = resolver.resolve("node-a").await.expect("resolves");
        let second = resolver.resolve("node-a").await.expect("resolves");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_unknown_node() {
        let resolver = fleet(&[("node-a", "10.0.0.1")]);
        let err = resolver.resolve("node-c").await.unwrap_err();
        assert!(matches!(err, GatewayError::NodeNotFound { node, .. } if node == "node-c"));
    }

    #[tokio::test]
    async fn test_resolve_any_returns_first_entry() {
        let resolver = fleet(&[("node-a", "10.0.0.1"), ("node-b", "10.0.0.2")]);
        let endpoint = resolver.resolve_any().await.expect("fleet is live");
        assert_eq!(endpoint.node, "node-a");
    }

    #[tokio::test]
    async fn test_resolve_any_empty_fleet() {
        let resolver = fleet(&[]);
        let err = resolver.resolve_any().await.unwrap_err();
        assert!(matches!(err, GatewayError::FleetUnavailable { .. }));
    }
}
