//! Websocket stream of bus events
//!
//! Clients connect with `?token=<jwt>` (headers are awkward from browser
//! websockets). A missing or invalid token still gets the stream as an
//! anonymous observer; the events carry no secrets beyond what the REST
//! reads expose.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::core::ServerState;
use crate::notify::ConnectedClient;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

pub async fn upgrade(
    State(state): State<ServerState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let (principal_id, role) = match query.token.as_deref().map(|t| state.jwt.validate_token(t)) {
        Some(Ok(claims)) => (claims.sub, format!("{:?}", claims.role).to_lowercase()),
        _ => ("anonymous".to_string(), "guest".to_string()),
    };
    ws.on_upgrade(move |socket| handle_socket(state, socket, principal_id, role))
}

async fn handle_socket(state: ServerState, mut socket: WebSocket, principal_id: String, role: String) {
    let connection_id = uuid::Uuid::new_v4().simple().to_string();
    state.bus.register(ConnectedClient {
        connection_id: connection_id.clone(),
        principal_id: principal_id.clone(),
        role,
        connected_at: Utc::now(),
    });
    debug!(connection_id = %connection_id, principal = %principal_id, "Websocket connected");

    let mut events = state.bus.subscribe();
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(message) => {
                        let Ok(text) = serde_json::to_string(&message) else {
                            continue;
                        };
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Lagged subscriber: skip missed events and carry on
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(connection_id = %connection_id, missed, "Websocket client lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.bus.unregister(&connection_id);
    debug!(connection_id = %connection_id, "Websocket disconnected");
}
