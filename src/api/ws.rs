// WebSocket push channel
// Per-user connection: the server pushes LabEvent envelopes; the client may
// send keep-alive pings and gets pongs back

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::ApiState;
use crate::engine::events::LabEvent;
use crate::models::AuthUser;

/// Outbound channel capacity per connection. Events beyond this while the
/// socket is backed up are dropped; the durable notification still lands.
const OUTBOUND_BUFFER: usize = 64;

/// Handler for WebSocket upgrade requests
/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
    caller: AuthUser,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, caller))
}

/// Drive one connection: register with the manager, forward pushed events
/// out, answer pings, unregister on close.
async fn handle_socket(mut socket: WebSocket, state: ApiState, caller: AuthUser) {
    let (tx, mut rx) = mpsc::channel::<LabEvent>(OUTBOUND_BUFFER);
    let connection_id = state.connections.register(caller.id.clone(), tx);
    info!(
        "🔌 websocket connected: user={} connection={}",
        caller.id, connection_id
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        let text = match serde_json::to_string(&event) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("failed to serialize event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    // channel closed: the manager pruned this connection
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if is_ping(&text) {
                            let pong = serde_json::to_string(&LabEvent::pong())
                                .unwrap_or_else(|_| String::from(r#"{"type":"pong"}"#));
                            if socket.send(Message::Text(pong)).await.is_err() {
                                break;
                            }
                        } else {
                            debug!("ignoring client message on connection {}", connection_id);
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("websocket error on connection {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    }

    state.connections.unregister(&connection_id);
    info!(
        "🔌 websocket disconnected: user={} connection={}",
        caller.id, connection_id
    );
}

/// The keep-alive ping is either the bare string "ping" or `{"type":"ping"}`
fn is_ping(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("ping") {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(|t| t == "ping"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_detection() {
        assert!(is_ping("ping"));
        assert!(is_ping("  PING "));
        assert!(is_ping(r#"{"type":"ping"}"#));
        assert!(!is_ping(r#"{"type":"subscribe"}"#));
        assert!(!is_ping("hello"));
        assert!(!is_ping(""));
    }
}
