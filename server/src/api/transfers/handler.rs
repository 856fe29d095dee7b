use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use shared::wallet::Transfer;
use validator::Validate;

use crate::auth::{Principal, Role};
use crate::core::ServerState;
use crate::orders::money::safe_amount;
use crate::reconcile;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct TransferRequest {
    /// Required for system callers; stores transfer from their own wallet
    pub store_id: Option<String>,
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
}

/// Transfer wallet funds to the vendor's bank account
pub async fn create(
    State(state): State<ServerState>,
    principal: Principal,
    Json(request): Json<TransferRequest>,
) -> AppResult<Json<Transfer>> {
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let store_id = match principal.role {
        Role::Store => principal.id,
        Role::System => request
            .store_id
            .ok_or_else(|| AppError::validation("store_id is required"))?,
        Role::Runner => return Err(AppError::forbidden("store access required")),
    };

    let store = state
        .storage
        .get_store(&store_id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("store {store_id}")))?;

    let amount = safe_amount(request.amount);
    let transfer =
        reconcile::process_transfer(&state.storage, &state.gateway, &store, amount, Utc::now())
            .await?;
    Ok(Json(transfer))
}

/// Payout audit trail for a store, newest first
pub async fn list(
    State(state): State<ServerState>,
    principal: Principal,
    Path(store_id): Path<String>,
) -> AppResult<Json<Vec<Transfer>>> {
    principal.ensure_store(&store_id)?;
    let transfers = state
        .storage
        .transfers_by_store(&store_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(transfers))
}
