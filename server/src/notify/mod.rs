//! Notification fan-out
//!
//! Three channels fed after every committed mutation:
//!
//! - realtime bus (websocket broadcast)
//! - device push (store and runner apps)
//! - template messaging (vendor new-order alert)
//!
//! All outbound delivery is fire-and-forget: tasks are spawned and
//! detached, failures logged inside the channel clients. A dead push
//! endpoint can never fail an order mutation.

pub mod bus;
pub mod messaging;
pub mod push;

pub use bus::{ConnectedClient, EventBus};
pub use messaging::MessagingClient;
pub use push::PushClient;

use rust_decimal::Decimal;
use shared::message::{BusMessage, EventKind};
use shared::order::Order;
use shared::profile::{RunnerProfile, StoreProfile};
use shared::wallet::Transfer;

use crate::core::config::Config;

#[derive(Clone)]
pub struct Notifier {
    bus: EventBus,
    push: PushClient,
    messaging: MessagingClient,
}

impl Notifier {
    pub fn new(config: &Config, bus: EventBus) -> Self {
        Self {
            bus,
            push: PushClient::new(config),
            messaging: MessagingClient::new(config),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn order_created(&self, order: &Order, store: Option<&StoreProfile>) {
        let message = format!("New order #{}", order.order_number);
        self.bus.publish(BusMessage::for_order(
            EventKind::OrderCreated,
            message.clone(),
            &order.id,
            order,
        ));

        if let Some(store) = store {
            let push = self.push.clone();
            let token = store.push_token.clone();
            let body = format!("{} placed order #{}", order.customer.name, order.order_number);
            tokio::spawn(async move {
                push.send(token.as_deref(), &message, &body).await;
            });

            let messaging = self.messaging.clone();
            let phone = store.phone.clone();
            let order = order.clone();
            tokio::spawn(async move {
                messaging.send_new_order(&phone, &order).await;
            });
        }
    }

    pub fn order_accepted(&self, order: &Order) {
        self.bus.publish(BusMessage::for_order(
            EventKind::OrderAccepted,
            format!("Order #{} accepted", order.order_number),
            &order.id,
            order,
        ));
    }

    pub fn runner_assigned(&self, order: &Order, runner: &RunnerProfile) {
        self.bus.publish(BusMessage::for_order(
            EventKind::RunnerAssigned,
            format!("{} assigned to order #{}", runner.name, order.order_number),
            &order.id,
            order,
        ));

        let push = self.push.clone();
        let token = runner.push_token.clone();
        let body = match order.delivery_price() {
            Some(price) => format!("Delivery for order #{}, ₦{}", order.order_number, price),
            None => format!("Delivery for order #{}", order.order_number),
        };
        tokio::spawn(async move {
            push.send(token.as_deref(), "New delivery", &body).await;
        });
    }

    pub fn runner_accepted(&self, order: &Order) {
        self.bus.publish(BusMessage::for_order(
            EventKind::RunnerAccepted,
            format!("Runner accepted order #{}", order.order_number),
            &order.id,
            order,
        ));
    }

    pub fn order_completed(&self, order: &Order, store: Option<&StoreProfile>) {
        let message = format!("Order #{} completed", order.order_number);
        self.bus.publish(BusMessage::for_order(
            EventKind::OrderCompleted,
            message.clone(),
            &order.id,
            order,
        ));

        if let Some(store) = store {
            let push = self.push.clone();
            let token = store.push_token.clone();
            tokio::spawn(async move {
                push.send(token.as_deref(), &message, "Delivery confirmed").await;
            });
        }
    }

    pub fn order_cancelled(&self, order: &Order) {
        self.bus.publish(BusMessage::for_order(
            EventKind::OrderCancelled,
            format!("Order #{} cancelled", order.order_number),
            &order.id,
            order,
        ));
    }

    pub fn payment_applied(&self, order: &Order, amount: Decimal, store: Option<&StoreProfile>) {
        let message = format!("Payment of ₦{} on order #{}", amount, order.order_number);
        self.bus.publish(BusMessage::for_order(
            EventKind::PaymentApplied,
            message.clone(),
            &order.id,
            order,
        ));

        if let Some(store) = store {
            let push = self.push.clone();
            let token = store.push_token.clone();
            tokio::spawn(async move {
                push.send(token.as_deref(), "Payment received", &message).await;
            });
        }
    }

    pub fn transfer_processed(&self, transfer: &Transfer) {
        self.bus.publish(BusMessage {
            event: EventKind::TransferProcessed,
            message: format!("Transfer of ₦{} processed", transfer.amount),
            order_id: None,
            payload: serde_json::to_value(transfer).ok(),
        });
    }
}
