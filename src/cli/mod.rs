use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// fleetgate - aggregating MCP gateway for a per-node agent fleet
///
/// Discovers the tool set from one live agent at startup, republishes each
/// tool with a required leading `node` parameter, and forwards every call
/// to the named node's agent.
#[derive(Parser, Debug)]
#[command(name = "fleetgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Name of the Service whose Endpoints list the agent fleet
    #[arg(long, env = "SERVICE_NAME", default_value = "backend-mcp-service")]
    pub service_name: String,

    /// Namespace the agent Service lives in
    #[arg(long, env = "SERVICE_NAMESPACE", default_value = "mcp-server")]
    pub service_namespace: String,

    /// Port every per-node agent listens on
    #[arg(long, env = "BACKEND_PORT", default_value = "9028")]
    pub backend_port: u16,

    /// Public port the gateway serves on (bound on all interfaces)
    #[arg(long, env = "FRONTEND_PORT", default_value = "9029")]
    pub frontend_port: u16,

    /// Kubernetes API server base URL
    ///
    /// Defaults to in-cluster discovery via KUBERNETES_SERVICE_HOST and the
    /// mounted service account. For local runs point this at a
    /// `kubectl proxy` (e.g. <http://127.0.0.1:8001>), which needs no token.
    #[arg(long, value_name = "URL", env = "KUBE_API_URL")]
    pub api_server: Option<String>,

    /// Bearer token file for API server authentication
    /// Only read when --api-server is set; in-cluster runs use the mounted
    /// service account token.
    #[arg(long, value_name = "PATH", env = "KUBE_TOKEN_FILE", requires = "api_server")]
    pub api_token_file: Option<PathBuf>,

    /// CA bundle (PEM) for API server TLS verification
    #[arg(long, value_name = "PATH", env = "KUBE_CA_FILE", requires = "api_server")]
    pub api_ca_file: Option<PathBuf>,

    /// Wall-clock timeout for one forwarded call in seconds
    #[arg(long, value_name = "SECONDS", env = "CALL_TIMEOUT_SECS", default_value = "120")]
    pub call_timeout: u64,

    /// Maximum number of concurrently forwarded calls
    #[arg(long, value_name = "COUNT", env = "MAX_INFLIGHT_CALLS", default_value = "64")]
    pub max_inflight: usize,
}

impl Cli {
    /// Per-call forwarding timeout
    pub fn call_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.call_timeout)
    }

    /// Public bind address: all interfaces on the frontend port
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.frontend_port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment_conventions() {
        let cli = Cli::parse_from(["fleetgate"]);
        assert_eq!(cli.service_name, "backend-mcp-service");
        assert_eq!(cli.service_namespace, "mcp-server");
        assert_eq!(cli.backend_port, 9028);
        assert_eq!(cli.frontend_port, 9029);
        assert_eq!(cli.bind_addr().port(), 9029);
    }

    #[test]
    fn test_flag_overrides() {
        let cli = Cli::parse_from([
            "fleetgate",
            "--service-name",
            "agents",
            "--backend-port",
            "7000",
            "--call-timeout",
            "5",
        ]);
        assert_eq!(cli.service_name, "agents");
        assert_eq!(cli.backend_port, 7000);
        assert_eq!(cli.call_timeout_duration(), Duration::from_secs(5));
    }
}
