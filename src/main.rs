use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};

use fleetgate::cli::Cli;
use fleetgate::cluster::{ApiServerConfig, EndpointsDirectory, NodeResolver};
use fleetgate::gateway::{self, GatewayConfig, GatewayServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create cancellation token for graceful shutdown
    let shutdown_token = tokio_util::sync::CancellationToken::new();

    // Spawn cross-platform signal handler
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        wait_for_interrupt().await;
        log::debug!("Received interrupt signal, shutting down");
        signal_token.cancel();
    });

    // Endpoint directory: explicit API server override, or in-cluster config
    let api = match &cli.api_server {
        Some(url) => ApiServerConfig::from_parts(
            url,
            cli.api_token_file.as_deref(),
            cli.api_ca_file.as_deref(),
        )?,
        None => ApiServerConfig::in_cluster()?,
    };
    let directory = EndpointsDirectory::new(api, &cli.service_namespace, &cli.service_name)?;
    let resolver = NodeResolver::new(Arc::new(directory), cli.service_name.clone());

    // Discover the fleet's tool set before binding the public port. Nothing
    // is served until this completes; a failure here aborts the process.
    log::info!(
        "discovering tools for service '{}' in namespace '{}'",
        cli.service_name,
        cli.service_namespace
    );
    let registry = match gateway::discover_tools(&resolver, cli.backend_port).await {
        Ok(registry) => registry,
        Err(e) => {
            log::error!("startup discovery failed: {e}");
            return Err(e.into());
        }
    };

    let gateway = GatewayServer::new(
        registry,
        resolver,
        GatewayConfig {
            backend_port: cli.backend_port,
            call_timeout: cli.call_timeout_duration(),
            max_inflight: cli.max_inflight,
        },
    );

    // Mount the streamable HTTP MCP service and serve until interrupted
    let service = StreamableHttpService::new(
        move || Ok(gateway.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(cli.bind_addr()).await?;
    log::info!("gateway ready on {}", cli.bind_addr());

    let serve_token = shutdown_token.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { serve_token.cancelled().await })
        .await?;

    log::info!("gateway stopped");
    Ok(())
}

/// Wait for interrupt signal (cross-platform)
#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm_result = signal(SignalKind::terminate());
    let mut sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result.as_mut(), sigint_result.as_mut()) {
        (Ok(sigterm), Ok(sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
        (Ok(sigterm), Err(_)) => {
            let _ = sigterm.recv().await;
        }
        (Err(_), Ok(sigint)) => {
            let _ = sigint.recv().await;
        }
        (Err(_), Err(_)) => {
            // If both fail, just wait forever (shouldn't happen)
            let () = std::future::pending().await;
        }
    }
}

/// Wait for interrupt signal (cross-platform)
#[cfg(windows)]
async fn wait_for_interrupt() {
    use tokio::signal::windows;

    match windows::ctrl_c() {
        Ok(mut ctrl_c) => {
            let _ = ctrl_c.recv().await;
        }
        Err(_) => {
            // If ctrl_c fails, wait forever (shouldn't happen)
            let () = std::future::pending().await;
        }
    }
}
