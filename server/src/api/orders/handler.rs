//! Order API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use shared::order::{CreateOrderInput, Delivery, Order, PaymentInput, PaymentRecord};
use validator::Validate;

use crate::auth::{Principal, Role};
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteRequest {
    #[validate(length(equal = 4, message = "delivery code is 4 digits"))]
    pub delivery_code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignRequest {
    #[validate(length(min = 1))]
    pub runner_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1))]
    pub method: String,
    pub reference: Option<String>,
}

/// Create an order (public checkout)
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.orders.create_order(&input)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders (system only, paginated)
pub async fn list(
    State(state): State<ServerState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    if !principal.is_system() {
        return Err(AppError::forbidden("system access required"));
    }
    Ok(Json(state.orders.list_orders(query.limit, query.offset)?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.orders.get_order(&id)?))
}

/// Vendor accepts a pending order
pub async fn accept(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let store_id = owning_store(&state, &principal, &id)?;
    Ok(Json(state.orders.accept_order(&id, &store_id)?))
}

pub async fn cancel(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let store_id = match principal.role {
        Role::Store => Some(principal.id),
        Role::System => None,
        Role::Runner => return Err(AppError::forbidden("runners cannot cancel orders")),
    };
    Ok(Json(state.orders.cancel_order(&id, store_id.as_deref())?))
}

/// Complete with the delivery code. Callable by the owning store or the
/// assigned runner, both of whom hold the code out of band.
pub async fn complete(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<CompleteRequest>,
) -> AppResult<Json<Order>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let order = state.orders.get_order(&id)?;
    let authorized = match principal.role {
        Role::System => true,
        Role::Store => order.store_id == principal.id,
        Role::Runner => order.runner_id() == Some(principal.id.as_str()),
    };
    if !authorized {
        return Err(AppError::forbidden("not a party to this order"));
    }

    Ok(Json(state.orders.complete_order(&id, &request.delivery_code)?))
}

pub async fn assign_runner(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> AppResult<Json<Order>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    owning_store(&state, &principal, &id)?;
    Ok(Json(state.orders.assign_runner(&id, &request.runner_id)?))
}

pub async fn runner_accept(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    if principal.role != Role::Runner {
        return Err(AppError::forbidden("runner access required"));
    }
    Ok(Json(state.orders.runner_accept(&id, &principal.id)?))
}

/// Record a manual payment (cash, bank transfer seen by the vendor)
pub async fn record_payment(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> AppResult<Json<Order>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    owning_store(&state, &principal, &id)?;

    let input = PaymentInput {
        amount: request.amount,
        method: request.method,
        reference: request.reference,
    };
    let (order, _applied) = state.orders.apply_payment(&id, &input)?;
    Ok(Json(order))
}

pub async fn payment_history(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<PaymentRecord>>> {
    let order = state.orders.get_order(&id)?;
    principal.ensure_store(&order.store_id)?;
    Ok(Json(order.payments))
}

pub async fn store_orders(
    State(state): State<ServerState>,
    principal: Principal,
    Path(store_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    principal.ensure_store(&store_id)?;
    Ok(Json(state.orders.store_orders(&store_id)?))
}

/// Order history for a customer account (system only; customers hold no
/// tokens of their own)
pub async fn customer_orders(
    State(state): State<ServerState>,
    principal: Principal,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    if !principal.is_system() {
        return Err(AppError::forbidden("system access required"));
    }
    Ok(Json(state.orders.customer_orders(&user_id)?))
}

/// Marketplace feed: pending orders with no runner bound
pub async fn incoming(
    State(state): State<ServerState>,
    principal: Principal,
    Path(runner_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    principal.ensure_runner(&runner_id)?;
    Ok(Json(state.orders.incoming_orders()?))
}

/// Jobs this runner has accepted and not yet delivered
pub async fn accepted_jobs(
    State(state): State<ServerState>,
    principal: Principal,
    Path(runner_id): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    principal.ensure_runner(&runner_id)?;
    let orders = state
        .orders
        .runner_orders(&runner_id)?
        .into_iter()
        .filter(|o| matches!(o.delivery, Delivery::Assigned { accepted: true, .. }))
        .filter(|o| !o.status.is_terminal())
        .collect();
    Ok(Json(orders))
}

/// Resolve the store authorized to mutate the order. Stores act on their
/// own orders; the system acts on any.
fn owning_store(state: &ServerState, principal: &Principal, order_id: &str) -> AppResult<String> {
    match principal.role {
        Role::Store => {
            let order = state.orders.get_order(order_id)?;
            if order.store_id != principal.id {
                return Err(AppError::forbidden("order belongs to another store"));
            }
            Ok(principal.id.clone())
        }
        Role::System => Ok(state.orders.get_order(order_id)?.store_id),
        Role::Runner => Err(AppError::forbidden("store access required")),
    }
}
