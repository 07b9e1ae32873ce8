use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::progress::{ProgressData, ProgressTracker};
use crate::state::SharedState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn progress_message(data: &ProgressData) -> Option<String> {
    serde_json::to_string(&serde_json::json!({
        "type": "progress-update",
        "data": data,
    }))
    .ok()
}

async fn handle_socket(mut socket: WebSocket, state: SharedState) {
    // Send the current snapshot so new clients render immediately.
    let tracker = ProgressTracker::new(&state.config.data_dir);
    if let Some(json) = progress_message(&tracker.read_or_idle()) {
        if socket.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    let mut rx = state.progress_tx.subscribe();
    let mut shutdown_rx = state.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            // Shutdown notification — tell client and close
            _ = shutdown_rx.recv() => {
                let _ = socket.send(Message::Text(r#"{"type":"shutdown"}"#.into())).await;
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            // New progress snapshot from the watcher
            result = rx.recv() => {
                match result {
                    Ok(data) => {
                        if let Some(json) = progress_message(&data) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    // A slow client missing snapshots just picks up the next one.
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            // Client messages — handle ping/pong/close
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Ignore text/binary from client
                }
            }
        }
    }

    debug!("WebSocket client disconnected");
}
