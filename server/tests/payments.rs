//! Payment reconciliation scenarios across manual and gateway paths

use rust_decimal::Decimal;
use server::{AppError, Config, ServerState};
use shared::order::{
    CreateOrderInput, CustomerInfo, LineItemInput, Order, OrderStatus, PaymentInput, PaymentStatus,
};
use shared::profile::StoreProfile;

fn state() -> ServerState {
    ServerState::in_memory(Config::for_tests()).unwrap()
}

fn seed_store(state: &ServerState, id: &str, plan: &str) {
    state
        .storage
        .save_store(&StoreProfile {
            id: id.into(),
            name: "Mama Put".into(),
            phone: "08011112222".into(),
            push_token: None,
            plan: plan.into(),
            payout_account: None,
            store_link: None,
        })
        .unwrap();
}

fn place_order(state: &ServerState, total: f64) -> Order {
    let input = CreateOrderInput {
        store_id: "s1".into(),
        customer_user_id: None,
        customer: CustomerInfo {
            name: "Ada".into(),
            contact: "08012345678".into(),
            address: None,
            pickup: true,
        },
        items: vec![LineItemInput {
            name: "Jollof rice".into(),
            quantity: 1,
            unit_price: total,
            variant: None,
            add_ons: vec![],
        }],
        items_amount: total,
        delivery_fee: 0.0,
        service_fee: 0.0,
        discount_amount: 0.0,
        discount_code: None,
        payment_method: "transfer".into(),
    };
    state.orders.create_order(&input).unwrap()
}

fn pay(state: &ServerState, order_id: &str, amount: f64, reference: Option<&str>) -> (Order, bool) {
    state
        .orders
        .apply_payment(
            order_id,
            &PaymentInput {
                amount,
                method: "transfer".into(),
                reference: reference.map(String::from),
            },
        )
        .unwrap()
}

#[tokio::test]
async fn test_partial_then_final_payment_with_replay() {
    let state = state();
    seed_store(&state, "s1", "Free");
    let order = place_order(&state, 5000.0);

    let (order, applied) = pay(&state, &order.id, 2000.0, None);
    assert!(applied);
    assert_eq!(order.amounts.amount_paid, Decimal::from(2000));
    assert_eq!(order.amounts.balance, Decimal::from(3000));
    assert_eq!(order.payment.status, PaymentStatus::Partial);

    let (order, applied) = pay(&state, &order.id, 3000.0, Some("R1"));
    assert!(applied);
    assert_eq!(order.amounts.amount_paid, Decimal::from(5000));
    assert_eq!(order.amounts.balance, Decimal::ZERO);
    assert_eq!(order.payment.status, PaymentStatus::Completed);

    // Replaying R1 is a success no-op: nothing moves
    let (order, applied) = pay(&state, &order.id, 3000.0, Some("R1"));
    assert!(!applied);
    assert_eq!(order.amounts.amount_paid, Decimal::from(5000));
    assert_eq!(order.payments.len(), 2);
    assert_eq!(order.payment.status, PaymentStatus::Completed);

    // Ledger equals running total
    let ledger: Decimal = order.payments.iter().map(|p| p.amount).sum();
    assert_eq!(ledger, order.amounts.amount_paid);
}

#[tokio::test]
async fn test_store_wallet_tracks_receivable() {
    let state = state();
    seed_store(&state, "s1", "Free");
    let order = place_order(&state, 5000.0);

    pay(&state, &order.id, 2000.0, None);
    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(2000));

    pay(&state, &order.id, 3000.0, Some("R1"));
    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(5000));
    assert_eq!(wallet.transactions.len(), 2);

    // Completion after full payment must not credit again
    state.orders.accept_order(&order.id, "s1").unwrap();
    let code = state.orders.get_order(&order.id).unwrap().delivery_code;
    state.orders.complete_order(&order.id, &code).unwrap();
    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(5000));
    assert_eq!(wallet.transactions.len(), 2);
}

#[tokio::test]
async fn test_completion_before_payment_credits_on_late_payment() {
    let state = state();
    seed_store(&state, "s1", "Free");
    let order = place_order(&state, 4000.0);

    state.orders.accept_order(&order.id, "s1").unwrap();
    let code = state.orders.get_order(&order.id).unwrap().delivery_code;
    state.orders.complete_order(&order.id, &code).unwrap();

    // Nothing paid yet, so completion credited nothing
    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::ZERO);

    // Late webhook settles the order; payments on completed orders are fine
    let (order, applied) = state
        .orders
        .apply_gateway_payment(&order.id, Decimal::from(4000), "card", "G1".into())
        .unwrap();
    assert!(applied);
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment.status, PaymentStatus::Completed);

    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(4000));
}

#[tokio::test]
async fn test_payments_rejected_on_cancelled_orders() {
    let state = state();
    seed_store(&state, "s1", "Free");
    let order = place_order(&state, 1000.0);
    state.orders.cancel_order(&order.id, None).unwrap();

    let err = state.orders.apply_payment(
        &order.id,
        &PaymentInput {
            amount: 1000.0,
            method: "cash".into(),
            reference: None,
        },
    );
    assert!(matches!(err, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_garbage_amounts_rejected() {
    let state = state();
    seed_store(&state, "s1", "Free");
    let order = place_order(&state, 1000.0);

    for bad in [f64::NAN, f64::INFINITY, -50.0, 0.0, 1e12] {
        let err = state.orders.apply_payment(
            &order.id,
            &PaymentInput {
                amount: bad,
                method: "cash".into(),
                reference: None,
            },
        );
        assert!(matches!(err, Err(AppError::Validation(_))), "amount {bad} accepted");
    }
}
