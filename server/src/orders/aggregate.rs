//! Order aggregate: creation and state-machine transitions
//!
//! Pure functions over [`Order`]: no storage, no clocks other than the
//! `now` each operation receives. The service layer wraps each call in a
//! single storage write transaction, so a guard failure leaves the
//! persisted order untouched.
//!
//! ```text
//! pending ──▶ accepted ──▶ in_progress ──▶ completed
//!    │            │              │
//!    └──────────┴──────────────┴───────▶ cancelled
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::order::{
    Amounts, CreateOrderInput, Delivery, LineItem, Order, OrderStatus, PaymentRecord,
    PaymentState, PaymentStatus,
};
use shared::profile::RunnerProfile;
use thiserror::Error;

use super::money::{round_money, safe_amount};

/// Domain errors for order operations
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Delivery code verification failed")]
    Verification,

    /// Payment replay, treated by callers as a success no-op
    #[error("Payment reference already applied: {0}")]
    DuplicateReference(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Build a new order from a checkout submission.
///
/// `total_amount` is computed here and locked in for the lifetime of the
/// order: items_amount + delivery_fee - discount_amount. Discounts and
/// fees are deliberately not recomputed from live records later.
pub fn create(
    input: &CreateOrderInput,
    order_number: String,
    delivery_code: String,
    payment_reference: String,
    now: DateTime<Utc>,
) -> OrderResult<Order> {
    if input.items.is_empty() {
        return Err(OrderError::Validation("order has no items".into()));
    }

    let items: Vec<LineItem> = input
        .items
        .iter()
        .map(|i| LineItem {
            name: i.name.clone(),
            quantity: i.quantity.max(1),
            unit_price: safe_amount(i.unit_price),
            variant: i.variant.as_ref().map(|v| shared::order::Variant {
                name: v.name.clone(),
                price: safe_amount(v.unit_price),
            }),
            add_ons: i
                .add_ons
                .iter()
                .map(|a| shared::order::AddOn {
                    name: a.name.clone(),
                    price: safe_amount(a.unit_price),
                })
                .collect(),
        })
        .collect();

    let items_amount = safe_amount(input.items_amount);
    let delivery_fee = safe_amount(input.delivery_fee);
    let service_fee = safe_amount(input.service_fee);
    let discount_amount = safe_amount(input.discount_amount);
    let total_amount = round_money(items_amount + delivery_fee - discount_amount);

    if total_amount < Decimal::ZERO {
        return Err(OrderError::Validation(
            "discount exceeds order amount".into(),
        ));
    }

    let delivery = if input.customer.pickup {
        Delivery::CustomerPickup
    } else {
        Delivery::Unassigned
    };

    Ok(Order {
        id: uuid::Uuid::new_v4().simple().to_string(),
        store_id: input.store_id.clone(),
        customer_user_id: input.customer_user_id.clone(),
        order_number,
        customer: input.customer.clone(),
        items,
        amounts: Amounts {
            items_amount,
            delivery_fee,
            service_fee,
            discount_amount,
            total_amount,
            amount_paid: Decimal::ZERO,
            balance: total_amount,
        },
        payment: PaymentState {
            status: PaymentStatus::Pending,
            method: input.payment_method.clone(),
            status_updated_at: None,
        },
        payments: Vec::new(),
        payment_reference,
        delivery,
        delivery_code,
        status: OrderStatus::Pending,
        discount_code: input.discount_code.clone(),
        runner_credited: false,
        store_credited_amount: Decimal::ZERO,
        created_at: now,
        updated_at: now,
        completed_at: None,
        cancelled_at: None,
    })
}

/// Vendor accepts a pending order.
///
/// Returns `true` when the order actually transitioned. Re-accepting an
/// already-accepted (or in-progress) order is an idempotent no-op, since
/// repeated accept clicks must not fail.
pub fn vendor_accept(order: &mut Order, now: DateTime<Utc>) -> OrderResult<bool> {
    match order.status {
        OrderStatus::Pending => {
            order.status = OrderStatus::Accepted;
            order.updated_at = now;
            Ok(true)
        }
        OrderStatus::Accepted | OrderStatus::InProgress => Ok(false),
        OrderStatus::Completed | OrderStatus::Cancelled => Err(OrderError::InvalidState(format!(
            "order {} cannot be accepted in status {:?}",
            order.id, order.status
        ))),
    }
}

/// Bind a runner to the order.
///
/// Fails on pickup orders, orders that already carry a runner, and orders
/// outside pending/accepted. `price` is fixed here and never recomputed.
pub fn assign_runner(
    order: &mut Order,
    runner: &RunnerProfile,
    price: Decimal,
    now: DateTime<Utc>,
) -> OrderResult<()> {
    match order.delivery {
        Delivery::CustomerPickup => {
            return Err(OrderError::InvalidOperation(format!(
                "order {} is a customer pickup order",
                order.id
            )));
        }
        Delivery::Assigned { .. } => {
            return Err(OrderError::InvalidOperation(format!(
                "order {} already has a runner assigned",
                order.id
            )));
        }
        Delivery::Unassigned => {}
    }

    if !matches!(order.status, OrderStatus::Pending | OrderStatus::Accepted) {
        return Err(OrderError::InvalidState(format!(
            "order {} cannot take a runner in status {:?}",
            order.id, order.status
        )));
    }

    order.delivery = Delivery::Assigned {
        runner_id: runner.id.clone(),
        runner_name: runner.name.clone(),
        contact: runner.phone.clone(),
        price,
        assigned_at: now,
        accepted: false,
        accepted_at: None,
    };
    order.updated_at = now;
    Ok(())
}

/// Runner explicitly accepts an assignment.
///
/// Flips `accepted` and, when the vendor has already accepted the order,
/// moves it to in_progress.
pub fn runner_accept(order: &mut Order, runner_id: &str, now: DateTime<Utc>) -> OrderResult<()> {
    match &mut order.delivery {
        Delivery::Assigned {
            runner_id: assigned,
            accepted,
            accepted_at,
            ..
        } => {
            if assigned != runner_id {
                return Err(OrderError::InvalidOperation(format!(
                    "order {} is assigned to a different runner",
                    order.id
                )));
            }
            if !*accepted {
                *accepted = true;
                *accepted_at = Some(now);
            }
        }
        _ => {
            return Err(OrderError::InvalidState(format!(
                "order {} has no runner assignment to accept",
                order.id
            )));
        }
    }

    if order.status == OrderStatus::Accepted {
        order.status = OrderStatus::InProgress;
    }
    order.updated_at = now;
    Ok(())
}

/// Complete the order against the shared delivery code.
///
/// One verification primitive for both delivery models: pickup and runner
/// delivery present the same 4-digit code. A wrong code never transitions
/// state. Wallet credits happen in the service layer, guarded by the
/// per-order idempotency markers.
pub fn complete(order: &mut Order, code: &str, now: DateTime<Utc>) -> OrderResult<()> {
    if !matches!(
        order.status,
        OrderStatus::Accepted | OrderStatus::InProgress
    ) {
        return Err(OrderError::InvalidState(format!(
            "order {} cannot be completed in status {:?}",
            order.id, order.status
        )));
    }

    if !order.is_pickup() && order.runner_id().is_none() {
        return Err(OrderError::InvalidOperation(format!(
            "order {} has no runner and is not a pickup order",
            order.id
        )));
    }

    if order.delivery_code != code {
        return Err(OrderError::Verification);
    }

    order.status = OrderStatus::Completed;
    order.completed_at = Some(now);
    order.updated_at = now;
    Ok(())
}

/// Cancel the order. Allowed from any non-terminal state; never touches
/// wallets.
pub fn cancel(order: &mut Order, now: DateTime<Utc>) -> OrderResult<()> {
    if order.status.is_terminal() {
        return Err(OrderError::InvalidState(format!(
            "order {} cannot be cancelled in status {:?}",
            order.id, order.status
        )));
    }
    order.status = OrderStatus::Cancelled;
    order.cancelled_at = Some(now);
    order.updated_at = now;
    Ok(())
}

/// Apply a payment to the order ledger.
///
/// Idempotent on the external reference: a reference already present in
/// the ledger fails with [`OrderError::DuplicateReference`], which callers
/// treat as a success no-op. After the append,
/// `amount_paid == sum(payments)` and `balance == total - paid`, and the
/// payment status is recomputed without ever regressing from completed.
pub fn apply_payment(
    order: &mut Order,
    amount: Decimal,
    method: &str,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> OrderResult<()> {
    if order.status == OrderStatus::Cancelled {
        return Err(OrderError::InvalidState(format!(
            "order {} is cancelled",
            order.id
        )));
    }
    if amount <= Decimal::ZERO {
        return Err(OrderError::Validation("payment amount must be positive".into()));
    }

    if let Some(reference) = &reference {
        let seen = order
            .payments
            .iter()
            .any(|p| p.reference.as_deref() == Some(reference.as_str()));
        if seen {
            return Err(OrderError::DuplicateReference(reference.clone()));
        }
    }

    order.payments.push(PaymentRecord {
        amount,
        method: method.to_string(),
        timestamp: now,
        reference,
    });
    order.amounts.amount_paid = round_money(order.amounts.amount_paid + amount);
    order.amounts.balance = round_money(order.amounts.total_amount - order.amounts.amount_paid);

    let next = if order.amounts.amount_paid >= order.amounts.total_amount {
        PaymentStatus::Completed
    } else if order.amounts.amount_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    };
    // Payment processing never regresses from completed
    if order.payment.status != PaymentStatus::Completed {
        order.payment.status = next;
    }
    order.payment.method = method.to_string();
    order.payment.status_updated_at = Some(now);
    order.updated_at = now;
    Ok(())
}
