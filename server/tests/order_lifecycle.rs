//! Full order lifecycle against the service layer and in-memory storage

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use server::{AppError, Config, ServerState};
use shared::order::{
    CreateOrderInput, CustomerInfo, Delivery, LineItemInput, OrderStatus, PaymentStatus,
};
use shared::profile::{RunnerProfile, StoreProfile};

fn state() -> ServerState {
    ServerState::in_memory(Config::for_tests()).unwrap()
}

fn seed_store(state: &ServerState, id: &str) {
    state
        .storage
        .save_store(&StoreProfile {
            id: id.into(),
            name: "Mama Put".into(),
            phone: "08011112222".into(),
            push_token: None,
            plan: "Free".into(),
            payout_account: None,
            store_link: None,
        })
        .unwrap();
}

fn seed_runner(state: &ServerState, id: &str) {
    state
        .storage
        .save_runner(&RunnerProfile {
            id: id.into(),
            name: "Bayo".into(),
            phone: "08133334444".into(),
            push_token: None,
            active: true,
        })
        .unwrap();
}

fn checkout(store_id: &str, pickup: bool) -> CreateOrderInput {
    CreateOrderInput {
        store_id: store_id.into(),
        customer_user_id: Some("user-1".into()),
        customer: CustomerInfo {
            name: "Ada".into(),
            contact: "08012345678".into(),
            address: Some("12 Allen Avenue".into()),
            pickup,
        },
        items: vec![LineItemInput {
            name: "Jollof rice".into(),
            quantity: 2,
            unit_price: 2250.0,
            variant: None,
            add_ons: vec![],
        }],
        items_amount: 4500.0,
        delivery_fee: 500.0,
        service_fee: 0.0,
        discount_amount: 0.0,
        discount_code: None,
        payment_method: "transfer".into(),
    }
}

#[tokio::test]
async fn test_full_delivery_lifecycle() {
    let state = state();
    seed_store(&state, "s1");
    seed_runner(&state, "r1");

    let order = state.orders.create_order(&checkout("s1", false)).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.order_number, "00001");
    assert_eq!(order.amounts.total_amount, Decimal::from(5000));
    assert_eq!(order.delivery_code.len(), 4);

    let order = state.orders.accept_order(&order.id, "s1").unwrap();
    assert_eq!(order.status, OrderStatus::Accepted);

    // Delivery fee 500, platform cut 37.5% -> runner price 312.5
    let order = state.orders.assign_runner(&order.id, "r1").unwrap();
    assert_eq!(
        order.delivery_price(),
        Some(Decimal::from_f64(312.5).unwrap())
    );

    let order = state.orders.runner_accept(&order.id, "r1").unwrap();
    assert_eq!(order.status, OrderStatus::InProgress);

    let code = order.delivery_code.clone();
    let order = state.orders.complete_order(&order.id, &code).unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(order.runner_credited);

    let wallet = state.storage.get_runner_wallet("r1").unwrap();
    assert_eq!(wallet.balance, Decimal::from_f64(312.5).unwrap());
    assert_eq!(wallet.transactions.len(), 1);

    // A second complete is an invalid transition and must not re-credit
    let err = state.orders.complete_order(&order.id, &code);
    assert!(matches!(err, Err(AppError::InvalidState(_))));
    let wallet = state.storage.get_runner_wallet("r1").unwrap();
    assert_eq!(wallet.balance, Decimal::from_f64(312.5).unwrap());
}

#[tokio::test]
async fn test_order_numbers_are_per_store_sequences() {
    let state = state();
    seed_store(&state, "s1");
    seed_store(&state, "s2");

    let a = state.orders.create_order(&checkout("s1", false)).unwrap();
    let b = state.orders.create_order(&checkout("s1", false)).unwrap();
    let c = state.orders.create_order(&checkout("s2", false)).unwrap();
    assert_eq!(a.order_number, "00001");
    assert_eq!(b.order_number, "00002");
    assert_eq!(c.order_number, "00001");
}

#[tokio::test]
async fn test_wrong_delivery_code_rejected() {
    let state = state();
    seed_store(&state, "s1");

    let order = state.orders.create_order(&checkout("s1", true)).unwrap();
    assert!(matches!(order.delivery, Delivery::CustomerPickup));
    state.orders.accept_order(&order.id, "s1").unwrap();

    let wrong = if order.delivery_code == "0000" { "1111" } else { "0000" };
    let err = state.orders.complete_order(&order.id, wrong);
    assert!(matches!(err, Err(AppError::Verification)));

    let unchanged = state.orders.get_order(&order.id).unwrap();
    assert_eq!(unchanged.status, OrderStatus::Accepted);
}

#[tokio::test]
async fn test_pickup_orders_never_take_runners() {
    let state = state();
    seed_store(&state, "s1");
    seed_runner(&state, "r1");

    let order = state.orders.create_order(&checkout("s1", true)).unwrap();
    let err = state.orders.assign_runner(&order.id, "r1");
    assert!(matches!(err, Err(AppError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_second_assignment_rejected() {
    let state = state();
    seed_store(&state, "s1");
    seed_runner(&state, "r1");
    seed_runner(&state, "r2");

    let order = state.orders.create_order(&checkout("s1", false)).unwrap();
    state.orders.assign_runner(&order.id, "r1").unwrap();
    let err = state.orders.assign_runner(&order.id, "r2");
    assert!(matches!(err, Err(AppError::InvalidOperation(_))));
}

#[tokio::test]
async fn test_accept_is_idempotent_and_scoped_to_owner() {
    let state = state();
    seed_store(&state, "s1");

    let order = state.orders.create_order(&checkout("s1", false)).unwrap();
    let err = state.orders.accept_order(&order.id, "s2");
    assert!(matches!(err, Err(AppError::Forbidden(_))));

    let first = state.orders.accept_order(&order.id, "s1").unwrap();
    let second = state.orders.accept_order(&order.id, "s1").unwrap();
    assert_eq!(first.status, OrderStatus::Accepted);
    assert_eq!(second.status, OrderStatus::Accepted);
}

#[tokio::test]
async fn test_cancel_blocks_further_transitions() {
    let state = state();
    seed_store(&state, "s1");

    let order = state.orders.create_order(&checkout("s1", false)).unwrap();
    let order = state.orders.cancel_order(&order.id, Some("s1")).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.payment.status, PaymentStatus::Pending);

    assert!(state.orders.accept_order(&order.id, "s1").is_err());
    assert!(state
        .orders
        .cancel_order(&order.id, Some("s1"))
        .is_err());
}

#[tokio::test]
async fn test_incoming_feed_tracks_assignment() {
    let state = state();
    seed_store(&state, "s1");
    seed_runner(&state, "r1");

    let delivery = state.orders.create_order(&checkout("s1", false)).unwrap();
    let _pickup = state.orders.create_order(&checkout("s1", true)).unwrap();

    let feed = state.orders.incoming_orders().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, delivery.id);

    state.orders.assign_runner(&delivery.id, "r1").unwrap();
    assert!(state.orders.incoming_orders().unwrap().is_empty());
    assert_eq!(state.orders.runner_orders("r1").unwrap().len(), 1);
}

#[tokio::test]
async fn test_customer_history_excludes_guests_and_other_accounts() {
    let state = state();
    seed_store(&state, "s1");

    let owned = state.orders.create_order(&checkout("s1", false)).unwrap();
    let mut guest = checkout("s1", false);
    guest.customer_user_id = None;
    state.orders.create_order(&guest).unwrap();
    let mut other = checkout("s1", false);
    other.customer_user_id = Some("user-2".into());
    state.orders.create_order(&other).unwrap();

    let history = state.orders.customer_orders("user-1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, owned.id);
    assert!(state.orders.customer_orders("user-3").unwrap().is_empty());
}
