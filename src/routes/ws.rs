// WebSocket push channel: status updates, topology and maintenance notifications

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::broadcast::ServerEvent;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the connection count on drop (connect = +1, drop = -1).
struct WsConnectionGuard(Arc<AtomicUsize>);

impl Drop for WsConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// False when the client is gone or too slow to take the message.
async fn send_with_timeout(socket: &mut WebSocket, message: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(message)).await, Ok(Ok(())))
}

pub(super) async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let mut rx = state.broadcaster.subscribe();
        let replay = if state.config.publishing.replay_on_connect {
            Some(state.cache.current())
        } else {
            None
        };
        if let Err(e) = stream_events(socket, &mut rx, state.ws_connections.clone(), replay).await
        {
            tracing::info!("Event stream error: {}", e);
        }
    })
}

async fn stream_events(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<ServerEvent>,
    conn_count: Arc<AtomicUsize>,
    replay: Option<Arc<crate::models::GlobalSnapshot>>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsConnectionGuard(conn_count);
    tracing::info!("Client connected to event stream");

    if let Some(snapshot) = replay.filter(|s| !s.is_empty()) {
        let json = serde_json::to_string(&ServerEvent::Update(snapshot.as_ref().clone()))?;
        if !send_with_timeout(&mut socket, Message::Text(json.into())).await {
            return Ok(());
        }
    }

    // first ping one period after connect, not immediately
    let mut ping_interval =
        tokio::time::interval_at(tokio::time::Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        let json = serde_json::to_string(&event)?;
                        if !send_with_timeout(&mut socket, Message::Text(json.into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws client lagged, skipped {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                if !send_with_timeout(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    tracing::info!("Client disconnected from event stream");
    Ok(())
}
