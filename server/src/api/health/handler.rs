use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::ServerState;

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
    environment: String,
}

pub async fn health(State(state): State<ServerState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        environment: state.config.environment.clone(),
    })
}
