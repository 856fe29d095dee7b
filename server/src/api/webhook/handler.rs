//! Gateway webhook handler
//!
//! Signature verification runs over the raw body before any parsing.
//! Responses, per the gateway's retry contract:
//!
//! - 401: signature missing or wrong (gateway retries)
//! - 404: order for the reference not found
//! - 200: applied, replayed, or event type we do not handle

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::core::ServerState;
use crate::gateway::{self, WebhookEvent};
use crate::utils::{AppError, AppResult};

const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

pub async fn payment_event(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<WebhookAck>)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if !gateway::verify_signature(&state.config.webhook_secret, &body, signature) {
        warn!("Webhook signature verification failed");
        return Err(AppError::Unauthorized);
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("malformed webhook payload: {e}")))?;

    if event.event != gateway::CHARGE_SUCCESS {
        info!(event = %event.event, "Unhandled webhook event type, acknowledged");
        return Ok((StatusCode::OK, Json(WebhookAck { status: "ignored" })));
    }

    let order_id = state
        .storage
        .order_id_by_reference(&event.data.reference)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| {
            warn!(reference = %event.data.reference, "Webhook for unknown payment reference");
            AppError::not_found(format!("no order for reference {}", event.data.reference))
        })?;

    let amount = gateway::from_minor_units(event.data.amount);
    let method = event.data.channel.as_deref().unwrap_or("gateway");
    let (_, applied) =
        state
            .orders
            .apply_gateway_payment(&order_id, amount, method, event.data.reference)?;

    let status = if applied { "applied" } else { "duplicate" };
    Ok((StatusCode::OK, Json(WebhookAck { status })))
}
