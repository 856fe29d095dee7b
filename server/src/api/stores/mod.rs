//! Store profile and wallet API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stores", post(handler::upsert))
        .route("/api/stores/{id}", get(handler::get_by_id))
        .route("/api/stores/{id}/wallet", get(handler::wallet))
}
