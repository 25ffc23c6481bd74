//! Endpoint directory backed by the Kubernetes Endpoints API.
//!
//! The agent fleet runs as a DaemonSet behind a headless Service; the
//! Endpoints object for that Service carries one `(nodeName, ip)` pair per
//! live agent. `EndpointsDirectory` reads that object with a single
//! authenticated GET and flattens it. There is no caching: every listing
//! re-queries the API server, so membership changes (agent restarts,
//! rescheduling) are picked up on the next call.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::GatewayError;

/// Service account paths mounted into every in-cluster pod.
const SA_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SA_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// One live agent: the node it runs on and the pod IP reaching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    pub node: String,
    pub ip: String,
}

/// Source of the current fleet membership listing.
///
/// Implementations must re-query their backing store on every call rather
/// than serve a cached snapshot.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list(&self) -> Result<Vec<NodeEndpoint>, GatewayError>;
}

/// How to reach the Kubernetes API server.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub ca_pem: Option<Vec<u8>>,
}

impl ApiServerConfig {
    /// In-cluster configuration from the pod environment and the mounted
    /// service account (token + CA bundle).
    pub fn in_cluster() -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").context(
            "KUBERNETES_SERVICE_HOST is not set; not running in a cluster (pass --api-server to override)",
        )?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT_HTTPS")
            .or_else(|_| std::env::var("KUBERNETES_SERVICE_PORT"))
            .unwrap_or_else(|_| "443".to_string());
        let token = std::fs::read_to_string(SA_TOKEN_PATH)
            .with_context(|| format!("failed to read service account token at {SA_TOKEN_PATH}"))?;
        let ca_pem = std::fs::read(SA_CA_PATH)
            .with_context(|| format!("failed to read service account CA bundle at {SA_CA_PATH}"))?;

        Ok(Self {
            base_url: format!("https://{host}:{port}"),
            token: Some(token.trim().to_string()),
            ca_pem: Some(ca_pem),
        })
    }

    /// Explicit configuration for out-of-cluster use. Pointing `base_url`
    /// at a local `kubectl proxy` needs neither token nor CA.
    pub fn from_parts(
        base_url: &str,
        token_file: Option<&std::path::Path>,
        ca_file: Option<&std::path::Path>,
    ) -> Result<Self> {
        let token = token_file
            .map(|path| {
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read API token file {}", path.display()))
            })
            .transpose()?
            .map(|token| token.trim().to_string());
        let ca_pem = ca_file
            .map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("failed to read API CA file {}", path.display()))
            })
            .transpose()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            ca_pem,
        })
    }
}

/// Directory over the Endpoints object of one `(service, namespace)` pair.
pub struct EndpointsDirectory {
    http: reqwest::Client,
    endpoints_url: String,
    token: Option<String>,
}

impl EndpointsDirectory {
    pub fn new(config: ApiServerConfig, namespace: &str, service: &str) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(pem) = &config.ca_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .context("invalid CA certificate for the API server")?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .context("failed to build the API server HTTP client")?;

        let endpoints_url = format!(
            "{}/api/v1/namespaces/{namespace}/endpoints/{service}",
            config.base_url.trim_end_matches('/'),
        );

        Ok(Self {
            http,
            endpoints_url,
            token: config.token,
        })
    }
}

#[async_trait]
impl Directory for EndpointsDirectory {
    async fn list(&self) -> Result<Vec<NodeEndpoint>, GatewayError> {
        let mut request = self.http.get(&self.endpoints_url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let endpoints: Endpoints = response.json().await?;
        Ok(flatten_endpoints(endpoints))
    }
}

// Trimmed core/v1 Endpoints shape; both lists serialize as null when empty.
#[derive(Debug, Deserialize)]
struct Endpoints {
    subsets: Option<Vec<EndpointSubset>>,
}

#[derive(Debug, Deserialize)]
struct EndpointSubset {
    addresses: Option<Vec<EndpointAddress>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointAddress {
    ip: String,
    node_name: Option<String>,
}

/// Walk `subsets[].addresses[]` in listing order, keeping only addresses
/// that carry a node name; an unnamed address cannot be targeted by node.
fn flatten_endpoints(endpoints: Endpoints) -> Vec<NodeEndpoint> {
    let mut entries = Vec::new();
    for subset in endpoints.subsets.unwrap_or_default() {
        for address in subset.addresses.unwrap_or_default() {
            if let Some(node) = address.node_name {
                entries.push(NodeEndpoint {
                    node,
                    ip: address.ip,
                });
            }
        }
    }
    entries
}
