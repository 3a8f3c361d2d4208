//! Local API Server

use crate::engine::Controller;
use crate::failover::FailoverEvent;
use crate::stats::Snapshot;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use sdwan_common::{SdwanError, SdwanResult};
use std::sync::Arc;
use tokio::sync::watch;

/// API routes
pub fn router(controller: Arc<Controller>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics))
        .route("/failovers", get(failovers))
        .with_state(controller)
}

/// Start local API server
///
/// Serves until `shutdown` turns true.
pub async fn start_server(
    addr: String,
    controller: Arc<Controller>,
    mut shutdown: watch::Receiver<bool>,
) -> SdwanResult<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SdwanError::Api(format!("bind {}: {}", addr, e)))?;
    tracing::info!("Controller API listening on {}", addr);

    axum::serve(listener, router(controller))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .map_err(|e| SdwanError::Api(e.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn stats(State(controller): State<Arc<Controller>>) -> Json<Snapshot> {
    Json(controller.snapshot())
}

async fn metrics(State(controller): State<Arc<Controller>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        controller.prometheus(),
    )
}

async fn failovers(State(controller): State<Arc<Controller>>) -> Json<Vec<FailoverEvent>> {
    Json(controller.failover_history())
}
