//! Route-level authentication and authorization

use axum::body::{Body, to_bytes};
use http::{Request, StatusCode};
use serde_json::json;
use server::api::build_app;
use server::{Config, Role, ServerState};
use shared::order::Order;
use shared::profile::StoreProfile;
use tower::ServiceExt;

fn setup() -> (ServerState, axum::Router) {
    let state = ServerState::in_memory(Config::for_tests()).unwrap();
    state
        .storage
        .save_store(&StoreProfile {
            id: "s1".into(),
            name: "Mama Put".into(),
            phone: "08011112222".into(),
            push_token: None,
            plan: "Free".into(),
            payout_account: None,
            store_link: None,
        })
        .unwrap();
    let app = build_app(&state).with_state(state.clone());
    (state, app)
}

fn checkout_body() -> serde_json::Value {
    json!({
        "store_id": "s1",
        "customer": {
            "name": "Ada",
            "contact": "08012345678",
            "pickup": false
        },
        "items": [
            { "name": "Jollof rice", "quantity": 2, "unit_price": 2250.0 }
        ],
        "items_amount": 4500.0,
        "delivery_fee": 500.0,
        "payment_method": "transfer"
    })
}

fn post(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (_state, app) = setup();
    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_is_public_and_returns_created() {
    let (_state, app) = setup();
    let response = app
        .oneshot(post("/api/orders", None, checkout_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Order = json_body(response).await;
    assert_eq!(order.order_number, "00001");
}

#[tokio::test]
async fn test_accept_requires_owning_store() {
    let (state, app) = setup();
    let response = app
        .clone()
        .oneshot(post("/api/orders", None, checkout_body()))
        .await
        .unwrap();
    let order: Order = json_body(response).await;
    let uri = format!("/api/orders/{}/accept", order.id);

    // No token
    let response = app
        .clone()
        .oneshot(post(&uri, None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Runner token
    let runner_token = state.jwt.generate_token("r1", Role::Runner).unwrap();
    let response = app
        .clone()
        .oneshot(post(&uri, Some(&runner_token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Another store's token
    let other_token = state.jwt.generate_token("s2", Role::Store).unwrap();
    let response = app
        .clone()
        .oneshot(post(&uri, Some(&other_token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner
    let owner_token = state.jwt.generate_token("s1", Role::Store).unwrap();
    let response = app
        .oneshot(post(&uri, Some(&owner_token), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let accepted: Order = json_body(response).await;
    assert_eq!(accepted.status, shared::order::OrderStatus::Accepted);
}

#[tokio::test]
async fn test_order_listing_is_system_only() {
    let (state, app) = setup();

    let store_token = state.jwt.generate_token("s1", Role::Store).unwrap();
    let response = app
        .clone()
        .oneshot(get("/api/orders", Some(&store_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let system_token = state.jwt.generate_token("ops", Role::System).unwrap();
    let response = app
        .oneshot(get("/api/orders", Some(&system_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wallets_are_scoped_to_their_owner() {
    let (state, app) = setup();

    let own = state.jwt.generate_token("r1", Role::Runner).unwrap();
    let other = state.jwt.generate_token("r2", Role::Runner).unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/runners/r1/wallet", Some(&other)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get("/api/runners/r1/wallet", Some(&own)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_withdrawals_are_runner_scoped_and_balance_guarded() {
    let (state, app) = setup();

    // Only the wallet owner (or the system) may withdraw
    let other = state.jwt.generate_token("r2", Role::Runner).unwrap();
    let response = app
        .clone()
        .oneshot(post(
            "/api/runners/r1/withdrawals",
            Some(&other),
            json!({ "amount": 100.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner with an empty wallet is rejected on balance
    let own = state.jwt.generate_token("r1", Role::Runner).unwrap();
    let response = app
        .clone()
        .oneshot(post(
            "/api/runners/r1/withdrawals",
            Some(&own),
            json!({ "amount": 100.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_history_is_system_only() {
    let (state, app) = setup();

    let mut body = checkout_body();
    body["customer_user_id"] = json!("user-1");
    let response = app
        .clone()
        .oneshot(post("/api/orders", None, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let store_token = state.jwt.generate_token("s1", Role::Store).unwrap();
    let response = app
        .clone()
        .oneshot(get("/api/orders/customer/user-1", Some(&store_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let system_token = state.jwt.generate_token("ops", Role::System).unwrap();
    let response = app
        .oneshot(get("/api/orders/customer/user-1", Some(&system_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let orders: Vec<Order> = json_body(response).await;
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn test_checkout_rejects_unknown_store() {
    let (_state, app) = setup();
    let mut body = checkout_body();
    body["store_id"] = json!("ghost");
    let response = app.oneshot(post("/api/orders", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
