//! Realtime bus messages
//!
//! Every order state transition and payment application publishes one
//! [`BusMessage`] to connected clients (store dashboards, runner apps).
//! Delivery is fire-and-forget; no acknowledgement is awaited.

use serde::{Deserialize, Serialize};

/// Named event kinds broadcast over the realtime channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    OrderCreated,
    OrderAccepted,
    OrderCancelled,
    OrderCompleted,
    RunnerAssigned,
    RunnerAccepted,
    PaymentApplied,
    TransferProcessed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub event: EventKind,
    /// Human-readable summary, mirrors what push/messaging channels say
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Updated resource payload (usually the full order)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl BusMessage {
    pub fn for_order<T: Serialize>(
        event: EventKind,
        message: impl Into<String>,
        order_id: impl Into<String>,
        payload: &T,
    ) -> Self {
        Self {
            event,
            message: message.into(),
            order_id: Some(order_id.into()),
            payload: serde_json::to_value(payload).ok(),
        }
    }
}
