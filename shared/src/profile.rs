//! Store and runner profiles, discounts
//!
//! The orchestration layer treats these as boundary records: only the
//! fields order/payout/notification flows need. Full profile management
//! lives elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bank account a vendor payout settles to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayoutAccount {
    pub bank_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    /// Device token for push notifications; absent token is a no-op
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    /// Subscription plan name; gates automatic payouts
    pub plan: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_account: Option<PayoutAccount>,
    /// Public storefront slug used in confirmation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    /// Whether the runner is currently taking jobs
    #[serde(default)]
    pub active: bool,
}

/// Store-scoped discount code. The discount is applied by the caller at
/// order creation; the resulting amount is locked into the order and never
/// recomputed from this record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub code: String,
    /// Percentage, 1-100
    pub percent: u32,
    pub store_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
