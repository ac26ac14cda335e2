//! Liveness probe server.
//!
//! Independent of the lifecycle controller: the configured path answers
//! `200 OK` with body `OK`, everything else is a 404.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing::info;

pub fn router(healthcheck_path: &str) -> Router {
    Router::new()
        .route(healthcheck_path, get(healthcheck))
        .fallback(not_found)
}

async fn healthcheck() -> &'static str {
    "OK"
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Serve the probe on `0.0.0.0:<port>` until the process exits.
pub async fn serve(port: u16, healthcheck_path: String) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, path = %healthcheck_path, "liveness probe listening");
    axum::serve(listener, router(&healthcheck_path)).await?;
    Ok(())
}
