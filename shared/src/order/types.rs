//! Order status enums, line items, and request inputs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `PENDING → ACCEPTED → IN_PROGRESS → COMPLETED`, with `CANCELLED`
/// reachable from the three non-terminal states. No transitions leave
/// a terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Payment status, a pure function of amount_paid vs total_amount.
/// Never regresses from `COMPLETED`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Completed,
    Failed,
}

/// Payment method + status pair on the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentState {
    pub status: PaymentStatus,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
}

/// One applied payment in the append-only ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub amount: Decimal,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    /// External reference (gateway events). Dedupe key: an order applies
    /// a given reference at most once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Selected product variant snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    pub name: String,
    pub price: Decimal,
}

/// Selected add-on snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOn {
    pub name: String,
    pub price: Decimal,
}

/// Order line item, an immutable snapshot taken at creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_ons: Vec<AddOn>,
}

/// Customer details captured on checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerInfo {
    pub name: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Self-pickup flag; pickup orders never take a runner
    #[serde(default)]
    pub pickup: bool,
}

/// Line item as submitted on checkout (amounts untrusted, coerced server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<VariantInput>,
    #[serde(default)]
    pub add_ons: Vec<AddOnInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInput {
    pub name: String,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddOnInput {
    pub name: String,
    pub unit_price: f64,
}

/// Checkout submission. All monetary inputs cross the external boundary
/// as f64 and are coerced through `safe_amount` on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderInput {
    pub store_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_user_id: Option<String>,
    pub customer: CustomerInfo,
    pub items: Vec<LineItemInput>,
    pub items_amount: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub service_fee: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    pub payment_method: String,
}

/// Manual payment submission (cash/transfer recording by a trusted caller)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub amount: f64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
