//! Runner profile and wallet API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/runners", post(handler::upsert))
        .route("/api/runners/{id}", get(handler::get_by_id))
        .route("/api/runners/{id}/wallet", get(handler::wallet))
        .route("/api/runners/{id}/withdrawals", post(handler::withdraw))
}
