//! HTTP front end: URL submission and artifact retrieval.
//!
//! - `POST /{archive}` with a form-encoded `url` field and Basic credentials
//!   queues a capture and answers with the new item id.
//! - `GET /{archive}/{id}` streams the canonical stored file for an id.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;

use crate::config::Settings;
use crate::repository::DbContext;
use crate::services::{AccessGuard, IngestEngine, Resolver};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub guard: AccessGuard,
    pub engine: IngestEngine,
    pub resolver: Resolver,
}

impl AppState {
    pub fn new(settings: &Settings, ctx: &DbContext) -> Self {
        Self {
            guard: AccessGuard::new(settings.archives.clone()),
            engine: IngestEngine::new(
                settings.agents.clone(),
                ctx.items(),
                settings.capture_timeout,
                settings.max_concurrent_captures,
            ),
            resolver: Resolver::new(settings.archives.clone(), ctx.items()),
        }
    }
}

/// Start the web server on `addr`. The schema must already be migrated.
pub async fn serve(settings: &Settings, ctx: &DbContext, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(settings, ctx);
    let engine = state.engine.clone();
    let app = create_router(state);

    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Waiting for in-flight captures");
    engine.wait_idle().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
