use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use shared::profile::RunnerProfile;
use shared::wallet::RunnerWallet;
use validator::Validate;

use crate::auth::Principal;
use crate::core::ServerState;
use crate::orders::money::safe_amount;
use crate::reconcile;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRunnerRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 7, message = "phone number too short"))]
    pub phone: String,
    pub push_token: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Register or update a runner profile (system)
pub async fn upsert(
    State(state): State<ServerState>,
    principal: Principal,
    Json(request): Json<UpsertRunnerRequest>,
) -> AppResult<Json<RunnerProfile>> {
    if !principal.is_system() {
        return Err(AppError::forbidden("system access required"));
    }
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let runner = RunnerProfile {
        id: request.id,
        name: request.name,
        phone: request.phone,
        push_token: request.push_token,
        active: request.active,
    };
    state
        .storage
        .save_runner(&runner)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(runner))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    _principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<RunnerProfile>> {
    let runner = state
        .storage
        .get_runner(&id)
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("runner {id}")))?;
    Ok(Json(runner))
}

/// Balance plus the full earning/withdrawal ledger
pub async fn wallet(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
) -> AppResult<Json<RunnerWallet>> {
    principal.ensure_runner(&id)?;
    let wallet = state
        .storage
        .get_runner_wallet(&id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(wallet))
}

#[derive(Debug, Deserialize, Validate)]
pub struct WithdrawRequest {
    #[validate(range(min = 0.01, message = "amount must be positive"))]
    pub amount: f64,
    pub note: Option<String>,
}

/// Cash out runner earnings. Rejected when the balance does not cover
/// the amount.
pub async fn withdraw(
    State(state): State<ServerState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(request): Json<WithdrawRequest>,
) -> AppResult<Json<RunnerWallet>> {
    principal.ensure_runner(&id)?;
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let amount = safe_amount(request.amount);
    let wallet = reconcile::withdraw_runner(&state.storage, &id, amount, request.note, Utc::now())?;
    Ok(Json(wallet))
}
