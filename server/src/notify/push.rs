//! Device push notifications
//!
//! Best-effort channel: a missing device token or unset endpoint is a
//! silent no-op, and delivery failures are logged and dropped. Push never
//! affects the outcome of the request that triggered it.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::Config;

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
    sound: &'static str,
}

#[derive(Clone)]
pub struct PushClient {
    client: reqwest::Client,
    api_url: String,
}

impl PushClient {
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_url: config.push_api_url.clone(),
        }
    }

    /// Send a push to a device token. No token or no endpoint means no-op.
    pub async fn send(&self, token: Option<&str>, title: &str, body: &str) {
        let Some(token) = token else {
            debug!(title = %title, "No push token registered, skipping push");
            return;
        };
        if self.api_url.is_empty() {
            return;
        }

        let request = PushRequest {
            to: token,
            title,
            body,
            sound: "default",
        };
        match self.client.post(&self.api_url).json(&request).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "Push endpoint returned non-success");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Push delivery failed");
            }
        }
    }
}
