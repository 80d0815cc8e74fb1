// HTTP routing: websocket upgrade plus small read-only endpoints.

use std::net::{SocketAddr, TcpListener};

use anyhow::Context;
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::watch;

use crate::app::AppState;
use crate::ws::ws_handler;

mod types;
pub use types::HealthResponse;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .route("/gestures", get(gestures))
        .with_state(app_state)
}

async fn health(AxumState(app_state): AxumState<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        subscribers: app_state.hub.len().await,
    })
}

async fn gestures(AxumState(app_state): AxumState<AppState>) -> impl IntoResponse {
    Json(app_state.codes.entries())
}

/// Serves the router on an already-bound listener until `shutdown` turns true.
pub async fn serve(
    listener: TcpListener,
    app_state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = router(app_state);
    axum::Server::from_tcp(listener)
        .context("failed to adopt websocket listener")?
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .context("websocket server failed")
}
