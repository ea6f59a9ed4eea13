//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Both entry points build one [`Dispatcher`] and share it across every session,
//! so the latency window is process-wide.

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use memdash::config::DashConfig;
use memdash::embedding;
use memdash::memory::backup::BackupManager;
use memdash::memory::latency::LatencyTracker;
use memdash::memory::store::SqliteVecStore;
use memdash::tools::Dispatcher;

use crate::mcp::MemoryTools;

/// Open the store, create the embedding provider, and wire up the dispatcher.
pub fn open_dispatcher(config: &DashConfig) -> Result<Dispatcher> {
    let store_path = config.resolved_store_path()?;
    let backups_path = config.resolved_backups_path()?;

    let provider = embedding::create_provider(&config.embedding)?;
    let embedder: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);
    tracing::info!(provider = embedder.name(), "embedding provider ready");

    let store = SqliteVecStore::open(&store_path, embedder)?;
    tracing::info!(store = %store_path.display(), backups = %backups_path.display(), "store ready");

    Ok(Dispatcher::new(
        Arc::new(store),
        Arc::new(LatencyTracker::new()),
        BackupManager::new(store_path, backups_path),
    )
    .with_default_n_results(config.retrieval.default_n_results))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: DashConfig) -> Result<()> {
    tracing::info!("starting memdash MCP server on stdio");

    let dispatcher = Arc::new(open_dispatcher(&config)?);
    let tools = MemoryTools::new(dispatcher);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP (SSE) transport.
pub async fn serve_sse(config: DashConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting memdash MCP server on SSE/HTTP");

    let dispatcher = Arc::new(open_dispatcher(&config)?);

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MemoryTools::new(Arc::clone(&dispatcher))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down SSE server");
        })
        .await?;

    Ok(())
}
