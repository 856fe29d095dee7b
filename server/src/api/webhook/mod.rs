//! Payment gateway webhook

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/webhooks/payments", post(handler::payment_event))
}
