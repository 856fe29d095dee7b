//! Server configuration
//!
//! All configuration items can be overridden through environment variables:
//!
//! | Env var | Default | Purpose |
//! |---------|---------|---------|
//! | `WORK_DIR` | `/var/lib/marketplace` | Database and log files |
//! | `HTTP_PORT` | `3000` | HTTP API port |
//! | `ENVIRONMENT` | `development` | development \| staging \| production |
//! | `JWT_SECRET` | dev secret | HS256 signing key for principal tokens |
//! | `WEBHOOK_SECRET` | empty | HMAC-SHA512 key for gateway webhooks |
//! | `GATEWAY_BASE_URL` | `https://api.paystack.co` | Payment gateway |
//! | `GATEWAY_SECRET` | empty | Gateway bearer token |
//! | `PUSH_API_URL` | empty | Push notification endpoint (empty = disabled) |
//! | `MESSAGING_API_URL` | empty | Messaging template endpoint (empty = disabled) |
//! | `MESSAGING_TOKEN` | empty | Messaging bearer token |
//! | `PLATFORM_CUT_PERCENT` | `37.5` | Platform share of the delivery fee |
//! | `DEFAULT_DELIVERY_PRICE` | `300` | Runner price when no delivery fee is set |
//! | `AUTO_PAYOUT_PLANS` | `Pro` | Comma-separated plans with automatic transfers |
//! | `REQUEST_TIMEOUT_MS` | `10000` | Outbound HTTP timeout |
//! | `SHUTDOWN_TIMEOUT_MS` | `10000` | Graceful shutdown window |

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Running environment: development | staging | production
    pub environment: String,
    /// HS256 signing key for principal tokens
    pub jwt_secret: String,

    // === Payment gateway ===
    /// Shared secret for webhook HMAC-SHA512 verification
    pub webhook_secret: String,
    pub gateway_base_url: String,
    pub gateway_secret: String,

    // === Notification channels ===
    /// Push endpoint; empty disables the channel
    pub push_api_url: String,
    /// Messaging template endpoint; empty disables the channel
    pub messaging_api_url: String,
    pub messaging_token: String,

    // === Delivery pricing ===
    /// Platform share of the delivery fee, in percent.
    /// Deliberately configuration: the business has not settled on one rate.
    pub platform_cut_percent: Decimal,
    /// Flat runner price when the order carries no delivery fee
    pub default_delivery_price: Decimal,

    // === Payouts ===
    /// Subscription plans entitled to automatic transfers on payment
    pub auto_payout_plans: Vec<String>,

    // === Timeouts ===
    /// Outbound HTTP call timeout (milliseconds)
    pub request_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/marketplace".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            jwt_secret: std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-only-jwt-secret".into()),

            webhook_secret: std::env::var("WEBHOOK_SECRET").unwrap_or_default(),
            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".into()),
            gateway_secret: std::env::var("GATEWAY_SECRET").unwrap_or_default(),

            push_api_url: std::env::var("PUSH_API_URL").unwrap_or_default(),
            messaging_api_url: std::env::var("MESSAGING_API_URL").unwrap_or_default(),
            messaging_token: std::env::var("MESSAGING_TOKEN").unwrap_or_default(),

            platform_cut_percent: env_decimal("PLATFORM_CUT_PERCENT", 37.5),
            default_delivery_price: env_decimal("DEFAULT_DELIVERY_PRICE", 300.0),

            auto_payout_plans: std::env::var("AUTO_PAYOUT_PLANS")
                .unwrap_or_else(|_| "Pro".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Whether the given subscription plan gets automatic payouts
    pub fn plan_auto_payout(&self, plan: &str) -> bool {
        self.auto_payout_plans.iter().any(|p| p == plan)
    }

    /// Configuration for tests: in-memory friendly defaults, no live endpoints
    pub fn for_tests() -> Self {
        Self {
            work_dir: ".".into(),
            http_port: 0,
            environment: "test".into(),
            jwt_secret: "test-jwt-secret".into(),
            webhook_secret: "test-webhook-secret".into(),
            gateway_base_url: "http://127.0.0.1:9".into(),
            gateway_secret: "test".into(),
            push_api_url: String::new(),
            messaging_api_url: String::new(),
            messaging_token: String::new(),
            platform_cut_percent: Decimal::new(375, 1),
            default_delivery_price: Decimal::from(300),
            auto_payout_plans: vec!["Pro".into()],
            request_timeout_ms: 500,
            shutdown_timeout_ms: 1000,
        }
    }
}

fn env_decimal(key: &str, default: f64) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<Decimal>().ok())
        .unwrap_or_else(|| Decimal::from_f64(default).unwrap_or_default())
}
