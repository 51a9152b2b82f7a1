use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api;
use crate::orchestrator::Orchestrator;

/// Upper bound on a whole request, comfortably above the worst-case planning
/// fan-out (branch timeouts run concurrently, not in sequence).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_BODY_BYTES: usize = 64 * 1024;

pub async fn run(orchestrator: Arc<Orchestrator>, port: u16) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new().nest("/api", api::router(orchestrator)).layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(cors)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
    );

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Planning server running at http://localhost:{port}");
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}
