//! Template messaging channel
//!
//! Sends templated messages (vendor "new_order" alerts) through an
//! external messaging provider. Like push, this channel is best-effort:
//! an unset endpoint is a no-op and delivery failures are logged only.

use serde_json::json;
use shared::order::{LineItem, Order};
use std::time::Duration;
use tracing::warn;

use crate::core::config::Config;

#[derive(Clone)]
pub struct MessagingClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl MessagingClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: config.messaging_api_url.clone(),
            token: config.messaging_token.clone(),
        }
    }

    /// Send the vendor-facing new-order template to the store's phone.
    pub async fn send_new_order(&self, phone: &str, order: &Order) {
        let total = format!("₦{}", order.amounts.total_amount);
        let body = json!({
            "messaging_product": "whatsapp",
            "to": phone,
            "type": "template",
            "template": {
                "name": "new_order",
                "language": { "code": "en_US" },
                "components": [
                    {
                        "type": "header",
                        "parameters": [{ "type": "text", "text": "New" }]
                    },
                    {
                        "type": "body",
                        "parameters": [
                            { "type": "text", "text": format_cart_items(&order.items) },
                            { "type": "text", "text": format!("{} (Qty: {})", total, order.items.len()) },
                            { "type": "text", "text": total },
                            { "type": "text", "text": format!("{} / {}", order.customer.name, order.customer.contact) }
                        ]
                    }
                ]
            }
        });
        self.post(body).await;
    }

    async fn post(&self, body: serde_json::Value) {
        if self.api_url.is_empty() {
            return;
        }
        match self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "Messaging endpoint returned non-success");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Message delivery failed");
            }
        }
    }
}

/// Render line items for the message body.
///
/// `2x Jollof rice - Large - ₦500 + Plantain - ₦200 / 1x Suya - ₦1000`
pub fn format_cart_items(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| {
            let price = match &item.variant {
                Some(variant) => format!("{} - ₦{}", variant.name, variant.price),
                None => format!("₦{}", item.unit_price),
            };
            let add_ons = item
                .add_ons
                .iter()
                .map(|a| format!("+ {} - ₦{}", a.name, a.price))
                .collect::<Vec<_>>()
                .join(" ");
            if add_ons.is_empty() {
                format!("{}x {} - {}", item.quantity, item.name, price)
            } else {
                format!("{}x {} - {} {}", item.quantity, item.name, price, add_ons)
            }
        })
        .collect::<Vec<_>>()
        .join(" / ")
}
