//! Realtime websocket endpoint

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handler::upgrade))
}
