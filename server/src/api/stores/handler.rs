use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::profile::{PayoutAccount, StoreProfile};
use shared::wallet::StoreWallet;
use validator::Validate;

use crate::auth::Principal;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertStoreRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 7, message = "phone number too short"))]
    pub phone: String,
    pub push_token: Option<String>,
    #[serde(default = "default_plan")]
    pub plan: String,
    pub payout_account: Option<PayoutAccount>,
    pub store_link: Option<String>,
}

fn default_plan() -> String {
    "Free".to_string()
}

/// Register or update a store profile (system)
pub async fn upsert(
    State(state): State<ServerState>,
    principal: Principal,
    Json(request): Json<UpsertStoreRequest>,
) -> AppResult<Json<StoreProfile>> {
    if !principal.is_system() {
        return Err(AppError::forbidden("system access required"));
    }
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let store = StoreProfile {
        id: request.id,
        name: request.name,
        phone: request.phone,
        push_token: request.push_token,
        plan: request.plan,
        payout_account: request.payout_account,
        store_link: request.store_link,
    };
    state
        .storage
        .save_store(&store)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(store))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<StoreProfile>> {
    let store = state
        .storage
        .get_store(&id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("store {id}")))?;
    Ok(Json(store))
}

/// Balance plus the full credit/debit ledger
pub async fn wallet(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<StoreWallet>> {
    principal.ensure_store(&id)?;
    let wallet = state
        .storage
        .get_store_wallet(&id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(wallet))
}
