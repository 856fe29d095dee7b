//! Payment gateway integration
//!
//! Two surfaces:
//!
//! - inbound webhook events (wire types + HMAC verification in
//!   [`signature`])
//! - outbound payout calls (recipient creation and transfer initiation)
//!
//! The gateway speaks minor currency units (value × 100). That conversion
//! is confined to this module; everything else in the server works in
//! major-unit [`Decimal`]s.

pub mod signature;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::core::config::Config;
use crate::utils::{AppError, AppResult};

pub use signature::{sign, verify_signature};

/// Webhook event name the reconciler acts on. Everything else is
/// acknowledged and ignored.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Inbound webhook envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

/// Payload of a charge event. `amount` arrives in minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub reference: String,
    pub amount: i64,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Convert a major-unit amount to the gateway's minor units
pub fn to_minor_units(amount: Decimal) -> i64 {
    (amount * Decimal::from(100)).round().to_i64().unwrap_or(0)
}

/// Convert a gateway minor-unit amount back to a major-unit Decimal
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[derive(Debug, Serialize)]
struct RecipientRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    account_number: &'a str,
    bank_code: &'a str,
    currency: &'static str,
}

#[derive(Debug, Deserialize)]
struct RecipientResponse {
    data: RecipientData,
}

#[derive(Debug, Deserialize)]
struct RecipientData {
    recipient_code: String,
}

#[derive(Debug, Serialize)]
struct TransferRequest<'a> {
    source: &'static str,
    amount: i64,
    recipient: &'a str,
    reason: &'a str,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    data: TransferData,
}

#[derive(Debug, Deserialize)]
struct TransferData {
    reference: String,
}

/// Outbound gateway client for payouts
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    secret: String,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: config.gateway_base_url.clone(),
            secret: config.gateway_secret.clone(),
        }
    }

    /// Register the vendor's bank account with the gateway and return the
    /// recipient code used to address transfers.
    pub async fn create_recipient(
        &self,
        account: &shared::profile::PayoutAccount,
    ) -> AppResult<String> {
        let url = format!("{}/transferrecipient", self.base_url);
        let body = RecipientRequest {
            kind: "nuban",
            name: &account.account_name,
            account_number: &account.account_number,
            bank_code: &account.bank_code,
            currency: "NGN",
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("recipient request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "Gateway rejected recipient creation");
            return Err(AppError::upstream(format!(
                "recipient creation returned {status}"
            )));
        }

        let parsed: RecipientResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("recipient response malformed: {e}")))?;
        Ok(parsed.data.recipient_code)
    }

    /// Initiate a transfer to a previously created recipient. Returns the
    /// gateway's transfer reference.
    pub async fn initiate_transfer(
        &self,
        recipient_code: &str,
        amount: Decimal,
        reason: &str,
    ) -> AppResult<String> {
        let url = format!("{}/transfer", self.base_url);
        let body = TransferRequest {
            source: "balance",
            amount: to_minor_units(amount),
            recipient: recipient_code,
            reason,
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("transfer request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(%status, "Gateway rejected transfer");
            return Err(AppError::upstream(format!("transfer returned {status}")));
        }

        let parsed: TransferResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("transfer response malformed: {e}")))?;
        Ok(parsed.data.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_minor_unit_conversion_roundtrip() {
        let amount = Decimal::from_f64(312.5).unwrap();
        assert_eq!(to_minor_units(amount), 31250);
        assert_eq!(from_minor_units(31250), amount);
        assert_eq!(to_minor_units(Decimal::ZERO), 0);
    }

    #[test]
    fn test_webhook_event_parses_gateway_shape() {
        let raw = r#"{
            "event": "charge.success",
            "data": { "reference": "ord_abc", "amount": 500000, "channel": "card" }
        }"#;
        let event: WebhookEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.event, CHARGE_SUCCESS);
        assert_eq!(event.data.reference, "ord_abc");
        assert_eq!(from_minor_units(event.data.amount), Decimal::from(5000));
    }
}
