//! Order aggregate and its wire types

mod types;

pub use types::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The order aggregate, the central persisted record.
///
/// All monetary fields are [`Decimal`] (2dp, half-up). Mutations go through
/// the server's order service, never by editing fields ad hoc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub store_id: String,
    /// Customer account id, when the order was placed by a logged-in user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_user_id: Option<String>,
    /// Per-store sequential number, zero-padded to 5 digits
    pub order_number: String,
    pub customer: CustomerInfo,
    /// Line items, immutable once the order is created
    pub items: Vec<LineItem>,
    pub amounts: Amounts,
    pub payment: PaymentState,
    /// Append-only payment ledger; sum of amounts == amounts.amount_paid
    pub payments: Vec<PaymentRecord>,
    /// Gateway reference generated at creation, unique per order.
    /// Webhook events locate the order through this value.
    pub payment_reference: String,
    pub delivery: Delivery,
    /// 4-digit shared secret required to complete delivery or pickup
    pub delivery_code: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    /// Set once the runner wallet has been credited for this order
    #[serde(default)]
    pub runner_credited: bool,
    /// Portion of the vendor receivable already credited to the store
    /// wallet for this order. Advances monotonically; replays are no-ops.
    #[serde(default)]
    pub store_credited_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Runner currently bound to this order, if any
    pub fn runner_id(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Assigned { runner_id, .. } => Some(runner_id.as_str()),
            _ => None,
        }
    }

    /// Delivery price fixed at assignment time, if a runner is bound
    pub fn delivery_price(&self) -> Option<Decimal> {
        match &self.delivery {
            Delivery::Assigned { price, .. } => Some(*price),
            _ => None,
        }
    }

    pub fn is_pickup(&self) -> bool {
        matches!(self.delivery, Delivery::CustomerPickup)
    }
}

/// Monetary totals locked in at creation plus the running paid/balance pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Amounts {
    pub items_amount: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub discount_amount: Decimal,
    /// items_amount + delivery_fee - discount_amount, fixed at creation
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    /// total_amount - amount_paid, recomputed on every payment
    pub balance: Decimal,
}

/// Where the order stands with its courier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Delivery {
    /// Delivery order with no runner bound yet
    Unassigned,
    /// Customer collects the order themselves; never takes a runner
    CustomerPickup,
    /// A runner has been bound; `accepted` flips on the runner's own call
    Assigned {
        runner_id: String,
        runner_name: String,
        contact: String,
        /// Runner earning for this order, fixed at assignment time
        price: Decimal,
        assigned_at: DateTime<Utc>,
        accepted: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        accepted_at: Option<DateTime<Utc>>,
    },
}
