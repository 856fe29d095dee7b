//! Order orchestration service
//!
//! Single entry point for every order mutation. Each operation runs read
//! → transition → write inside one storage write transaction; wallet
//! credits triggered by the transition commit in the same transaction.
//! Notification fan-out happens strictly after commit.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use shared::order::{CreateOrderInput, Order, PaymentInput, PaymentStatus};
use shared::profile::StoreProfile;
use tracing::{info, warn};

use crate::assignment;
use crate::core::config::Config;
use crate::gateway::GatewayClient;
use crate::notify::Notifier;
use crate::orders::aggregate::{self, OrderError};
use crate::orders::money::safe_amount;
use crate::orders::storage::{Storage, StorageError};
use crate::reconcile;
use crate::utils::{AppError, AppResult};

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Validation(msg) => AppError::Validation(msg),
            OrderError::InvalidState(msg) => AppError::InvalidState(msg),
            OrderError::InvalidOperation(msg) => AppError::InvalidOperation(msg),
            OrderError::Verification => AppError::Verification,
            // Callers turn replays into success no-ops before this point
            OrderError::DuplicateReference(msg) => AppError::InvalidOperation(msg),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::OrderNotFound(id) => AppError::not_found(format!("order {id}")),
            other => AppError::database(other.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    storage: Storage,
    config: Config,
    notifier: Notifier,
    gateway: GatewayClient,
}

impl OrderService {
    pub fn new(storage: Storage, config: Config, notifier: Notifier, gateway: GatewayClient) -> Self {
        Self {
            storage,
            config,
            notifier,
            gateway,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_id: &str) -> AppResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {order_id}")))
    }

    pub fn store_orders(&self, store_id: &str) -> AppResult<Vec<Order>> {
        Ok(self.storage.orders_by_store(store_id)?)
    }

    pub fn incoming_orders(&self) -> AppResult<Vec<Order>> {
        Ok(self.storage.incoming_orders()?)
    }

    pub fn runner_orders(&self, runner_id: &str) -> AppResult<Vec<Order>> {
        Ok(self.storage.orders_for_runner(runner_id)?)
    }

    pub fn customer_orders(&self, user_id: &str) -> AppResult<Vec<Order>> {
        Ok(self.storage.orders_for_customer(user_id)?)
    }

    // ========== Mutations ==========

    /// Create an order from a checkout submission.
    pub fn create_order(&self, input: &CreateOrderInput) -> AppResult<Order> {
        let store = self
            .storage
            .get_store(&input.store_id)?
            .ok_or_else(|| AppError::not_found(format!("store {}", input.store_id)))?;

        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let order = {
            let number = self.storage.next_order_number_txn(&txn, &input.store_id)?;
            let order_number = format!("{number:05}");
            let delivery_code = format!("{:04}", rand::thread_rng().gen_range(0..10_000));
            let payment_reference = format!("ord_{}", uuid::Uuid::new_v4().simple());

            let order =
                aggregate::create(input, order_number, delivery_code, payment_reference, now)?;
            self.storage.save_order_txn(&txn, &order)?;
            self.storage
                .index_reference_txn(&txn, &order.payment_reference, &order.id)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        info!(order_id = %order.id, store_id = %order.store_id, number = %order.order_number, "Order created");
        self.notifier.order_created(&order, Some(&store));
        Ok(order)
    }

    /// Vendor accepts the order. Idempotent for repeated accepts.
    pub fn accept_order(&self, order_id: &str, store_id: &str) -> AppResult<Order> {
        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let (order, changed) = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            if order.store_id != store_id {
                return Err(AppError::forbidden("order belongs to another store"));
            }
            let changed = aggregate::vendor_accept(&mut order, now)?;
            if changed {
                self.storage.save_order_txn(&txn, &order)?;
            }
            (order, changed)
        };
        txn.commit().map_err(StorageError::from)?;

        if changed {
            info!(order_id = %order.id, "Order accepted");
            self.notifier.order_accepted(&order);
        }
        Ok(order)
    }

    /// Bind a runner to the order at the configured delivery price.
    pub fn assign_runner(&self, order_id: &str, runner_id: &str) -> AppResult<Order> {
        let runner = self
            .storage
            .get_runner(runner_id)?
            .ok_or_else(|| AppError::not_found(format!("runner {runner_id}")))?;
        if !runner.active {
            return Err(AppError::InvalidOperation(format!(
                "runner {runner_id} is not active"
            )));
        }

        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let order = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            let price = assignment::delivery_price(&self.config, order.amounts.delivery_fee);
            aggregate::assign_runner(&mut order, &runner, price, now)?;
            self.storage.save_order_txn(&txn, &order)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        info!(order_id = %order.id, runner_id = %runner.id, "Runner assigned");
        self.notifier.runner_assigned(&order, &runner);
        Ok(order)
    }

    /// Runner confirms the assignment.
    pub fn runner_accept(&self, order_id: &str, runner_id: &str) -> AppResult<Order> {
        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let order = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            aggregate::runner_accept(&mut order, runner_id, now)?;
            self.storage.save_order_txn(&txn, &order)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        self.notifier.runner_accepted(&order);
        Ok(order)
    }

    /// Complete the order with the delivery code; credits the runner once
    /// and advances the store credit when payment has already landed.
    pub fn complete_order(&self, order_id: &str, code: &str) -> AppResult<Order> {
        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let order = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            aggregate::complete(&mut order, code, now)?;
            reconcile::credit_runner_txn(&self.storage, &txn, &mut order, now)?;
            reconcile::credit_store_txn(&self.storage, &txn, &mut order, now)?;
            self.storage.save_order_txn(&txn, &order)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        info!(order_id = %order.id, "Order completed");
        let store = self.storage.get_store(&order.store_id)?;
        self.notifier.order_completed(&order, store.as_ref());
        Ok(order)
    }

    /// Cancel a non-terminal order.
    pub fn cancel_order(&self, order_id: &str, store_id: Option<&str>) -> AppResult<Order> {
        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let order = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            if let Some(store_id) = store_id {
                if order.store_id != store_id {
                    return Err(AppError::forbidden("order belongs to another store"));
                }
            }
            aggregate::cancel(&mut order, now)?;
            self.storage.save_order_txn(&txn, &order)?;
            order
        };
        txn.commit().map_err(StorageError::from)?;

        info!(order_id = %order.id, "Order cancelled");
        self.notifier.order_cancelled(&order);
        Ok(order)
    }

    pub fn list_orders(&self, limit: usize, offset: usize) -> AppResult<Vec<Order>> {
        Ok(self.storage.all_orders(limit, offset)?)
    }

    /// Apply a manually recorded payment. Returns the order and whether
    /// the payment was actually applied (`false` for a replayed
    /// reference).
    pub fn apply_payment(&self, order_id: &str, input: &PaymentInput) -> AppResult<(Order, bool)> {
        let amount = safe_amount(input.amount);
        self.apply_payment_amount(order_id, amount, &input.method, input.reference.clone(), false)
    }

    /// Apply a gateway-confirmed payment. The amount is already exact,
    /// converted from minor units at the webhook boundary. A charge
    /// landing after the payment has been settled is a success no-op.
    pub fn apply_gateway_payment(
        &self,
        order_id: &str,
        amount: Decimal,
        method: &str,
        reference: String,
    ) -> AppResult<(Order, bool)> {
        self.apply_payment_amount(order_id, amount, method, Some(reference), true)
    }

    fn apply_payment_amount(
        &self,
        order_id: &str,
        amount: Decimal,
        method: &str,
        reference: Option<String>,
        from_gateway: bool,
    ) -> AppResult<(Order, bool)> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation("payment amount must be positive"));
        }

        let now = Utc::now();
        let txn = self.storage.begin_write()?;
        let outcome = {
            let mut order = self.storage.load_order_txn(&txn, order_id)?;
            if from_gateway && order.payment.status == PaymentStatus::Completed {
                info!(order_id = %order.id, "Gateway charge on a settled order, no-op");
                return Ok((order, false));
            }
            match aggregate::apply_payment(&mut order, amount, method, reference, now) {
                Ok(()) => {
                    let credited =
                        reconcile::credit_store_txn(&self.storage, &txn, &mut order, now)?;
                    self.storage.save_order_txn(&txn, &order)?;
                    Ok((order, credited))
                }
                // Same reference seen before: the earlier application stands
                Err(OrderError::DuplicateReference(reference)) => {
                    info!(order_id = %order.id, reference = %reference, "Duplicate payment reference, no-op");
                    Err(order)
                }
                Err(e) => return Err(e.into()),
            }
        };

        match outcome {
            Ok((order, credited)) => {
                txn.commit().map_err(StorageError::from)?;
                info!(order_id = %order.id, amount = %amount, "Payment applied");

                let store = self.storage.get_store(&order.store_id)?;
                self.notifier.payment_applied(&order, amount, store.as_ref());
                if let (Some(store), Some(credited)) = (store, credited) {
                    self.maybe_auto_payout(store, credited);
                }
                Ok((order, true))
            }
            Err(order) => Ok((order, false)),
        }
    }

    /// Kick off an automatic payout for plans entitled to one. Detached:
    /// the triggering payment has already committed, and a failed transfer
    /// is recorded for manual retry.
    fn maybe_auto_payout(&self, store: StoreProfile, credited: Decimal) {
        if !self.config.plan_auto_payout(&store.plan) || store.payout_account.is_none() {
            return;
        }
        // The fee comes out of the credited amount
        let amount = credited - reconcile::transfer_fee(credited);
        if amount <= Decimal::ZERO {
            return;
        }

        let storage = self.storage.clone();
        let gateway = self.gateway.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match reconcile::process_transfer(&storage, &gateway, &store, amount, Utc::now()).await
            {
                Ok(transfer) => notifier.transfer_processed(&transfer),
                Err(e) => {
                    warn!(store_id = %store.id, error = %e, "Automatic payout failed, retained in wallet");
                }
            }
        });
    }
}
