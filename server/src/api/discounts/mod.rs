//! Discount code API

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/discounts", post(handler::create))
        .route("/api/discounts/{store_id}", get(handler::list))
        .route("/api/discounts/{store_id}/{code}", get(handler::lookup))
}
