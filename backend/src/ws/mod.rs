// WebSocket transport: one task per subscriber draining its hub channel.

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State as AxumState};
use axum::response::IntoResponse;
use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::utils::monotonic_ms;

pub async fn ws_handler(
    AxumState(app_state): AxumState<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, app_state))
}

async fn handle_socket(mut socket: WebSocket, peer: SocketAddr, app_state: AppState) {
    let hub = app_state.hub.clone();
    let mut shutdown = app_state.shutdown.clone();
    let (subscriber, mut rx) = hub.subscriber(Some(peer));
    let id = subscriber.id;
    let connected_at = Instant::now();
    hub.register(subscriber).await;
    let subscribers = hub.len().await;
    info!(id, %peer, subscribers, "ws connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(payload) = outbound else { break };
                if let Err(err) = socket.send(Message::Text(payload)).await {
                    debug!(id, ?err, "ws send failed");
                    break;
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(id, ?err, "ws error");
                        break;
                    }
                    None => break,
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    drop(rx);
    hub.unregister(id).await;
    let subscribers = hub.len().await;
    info!(
        id,
        %peer,
        connected_ms = monotonic_ms(connected_at),
        subscribers,
        "ws disconnected"
    );
}
