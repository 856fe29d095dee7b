//! Payout transfer behavior: balance validation and gateway failure

use chrono::Utc;
use rust_decimal::Decimal;
use server::reconcile;
use server::{AppError, Config, ServerState};
use shared::order::{CreateOrderInput, CustomerInfo, LineItemInput, PaymentInput};
use shared::profile::{PayoutAccount, StoreProfile};
use shared::wallet::TransferStatus;

fn store_with_account() -> StoreProfile {
    StoreProfile {
        id: "s1".into(),
        name: "Mama Put".into(),
        phone: "08011112222".into(),
        push_token: None,
        plan: "Free".into(),
        payout_account: Some(PayoutAccount {
            bank_name: "First Bank".into(),
            bank_code: "011".into(),
            account_number: "0123456789".into(),
            account_name: "Mama Put Ltd".into(),
        }),
        store_link: None,
    }
}

/// Fund the store wallet by paying off an order
fn fund_wallet(state: &ServerState, amount: f64) {
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
            name: "Catering".into(),
            quantity: 1,
            unit_price: amount,
            variant: None,
            add_ons: vec![],
        }],
        items_amount: amount,
        delivery_fee: 0.0,
        service_fee: 0.0,
        discount_amount: 0.0,
        discount_code: None,
        payment_method: "transfer".into(),
    };
    let order = state.orders.create_order(&input).unwrap();
    state
        .orders
        .apply_payment(
            &order.id,
            &PaymentInput {
                amount,
                method: "transfer".into(),
                reference: None,
            },
        )
        .unwrap();
}

#[tokio::test]
async fn test_balance_must_cover_amount_plus_fee() {
    let state = ServerState::in_memory(Config::for_tests()).unwrap();
    let store = store_with_account();
    state.storage.save_store(&store).unwrap();
    fund_wallet(&state, 10_005.0);

    // 10000 needs fee 25 on top: 10005 < 10025
    let err = reconcile::process_transfer(
        &state.storage,
        &state.gateway,
        &store,
        Decimal::from(10_000),
        Utc::now(),
    )
    .await;
    assert!(matches!(err, Err(AppError::InvalidOperation(_))));

    // Wallet untouched, failed attempt audited
    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(10_005));
    let transfers = state.storage.transfers_by_store("s1").unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].status, TransferStatus::Failed);
}

#[tokio::test]
async fn test_gateway_failure_leaves_wallet_intact() {
    // Test config points the gateway at an unreachable address
    let state = ServerState::in_memory(Config::for_tests()).unwrap();
    let store = store_with_account();
    state.storage.save_store(&store).unwrap();
    fund_wallet(&state, 10_000.0);

    let err = reconcile::process_transfer(
        &state.storage,
        &state.gateway,
        &store,
        Decimal::from(5_000),
        Utc::now(),
    )
    .await;
    assert!(matches!(err, Err(AppError::Upstream(_))));

    let wallet = state.storage.get_store_wallet("s1").unwrap();
    assert_eq!(wallet.balance, Decimal::from(10_000));
    let transfers = state.storage.transfers_by_store("s1").unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].status, TransferStatus::Failed);
    assert!(transfers[0].transfer_reference.is_none());
}

#[tokio::test]
async fn test_transfer_requires_payout_account() {
    let state = ServerState::in_memory(Config::for_tests()).unwrap();
    let mut store = store_with_account();
    store.payout_account = None;
    state.storage.save_store(&store).unwrap();
    fund_wallet(&state, 10_000.0);

    let err = reconcile::process_transfer(
        &state.storage,
        &state.gateway,
        &store,
        Decimal::from(1_000),
        Utc::now(),
    )
    .await;
    assert!(matches!(err, Err(AppError::Validation(_))));
}
