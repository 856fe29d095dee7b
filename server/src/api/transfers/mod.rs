//! Vendor payout transfers

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/transfers", post(handler::create))
        .route("/api/transfers/{store_id}", get(handler::list))
}
