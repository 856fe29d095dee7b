//! HTTP API
//!
//! One module per resource, each exposing a `router()` merged here.
//! Handlers do authorization as a precondition (via the [`Principal`]
//! extractor) and delegate every mutation to the order service.
//!
//! [`Principal`]: crate::auth::Principal

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;

pub mod discounts;
pub mod health;
pub mod orders;
pub mod realtime;
pub mod runners;
pub mod stores;
pub mod transfers;
pub mod webhook;

pub use crate::utils::{AppResponse, AppResult};

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(webhook::router())
        .merge(transfers::router())
        .merge(runners::router())
        .merge(stores::router())
        .merge(discounts::router())
        .merge(realtime::router())
}

/// Build a fully configured application with all middleware.
///
/// Used by both the HTTP server and in-process test calls.
pub fn build_app(_state: &ServerState) -> Router<ServerState> {
    build_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
}
