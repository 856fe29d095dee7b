//! Order API
//!
//! Checkout is public; every other route carries a principal token.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/accept", post(handler::accept))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/assign-runner", post(handler::assign_runner))
        .route("/{id}/runner-accept", post(handler::runner_accept))
        .route(
            "/{id}/payments",
            post(handler::record_payment).get(handler::payment_history),
        )
        .route("/store/{store_id}", get(handler::store_orders))
        .route("/customer/{user_id}", get(handler::customer_orders))
        .route("/runner/{runner_id}/incoming", get(handler::incoming))
        .route("/runner/{runner_id}/accepted", get(handler::accepted_jobs))
}
