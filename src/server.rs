use rmcp::ServiceExt;
use rmcp::transport::sse_server::SseServer;
use rmcp::transport::stdio;
use std::sync::Arc;
use tracing_subscriber::{self, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::mcp::DocsServer;
use crate::service::DocsService;

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level. With `stderr` set, output goes to stderr without colors so
/// stdout stays free for the stdio transport.
pub fn init_tracing(stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".to_string().into());
    if stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

// start sse server
pub async fn start_sse_server(addr: &str, service: Arc<DocsService>) -> anyhow::Result<()> {
    tracing::info!("Starting MCP SSE server on {}", addr);

    let ct = SseServer::serve(addr.parse()?)
        .await?
        .with_service(move || DocsServer::new(service.clone()));

    tokio::signal::ctrl_c().await?;
    ct.cancel();
    Ok(())
}

// start stdio server
pub async fn start_stdio_server(service: Arc<DocsService>) -> anyhow::Result<()> {
    tracing::info!("Starting MCP server");

    let running = DocsServer::new(service).serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    running.waiting().await?;
    Ok(())
}

// start http query server
pub async fn start_http_server(addr: &str, service: Arc<DocsService>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, crate::http::router(service))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
