use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use shared::profile::Discount;
use validator::Validate;

use crate::auth::Principal;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDiscountRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(range(min = 1, max = 100, message = "percent must be 1-100"))]
    pub percent: u32,
    #[validate(length(min = 1))]
    pub store_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn create(
    State(state): State<ServerState>,
    principal: Principal,
    Json(request): Json<CreateDiscountRequest>,
) -> AppResult<(StatusCode, Json<Discount>)> {
    principal.ensure_store(&request.store_id)?;
    request
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let discount = Discount {
        code: request.code,
        percent: request.percent,
        store_id: request.store_id,
        active: request.active,
        created_at: Utc::now(),
    };
    state
        .storage
        .save_discount(&discount)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub async fn list(
    State(state): State<ServerState>,
    principal: Principal,
    Path(store_id): Path<String>,
) -> AppResult<Json<Vec<Discount>>> {
    principal.ensure_store(&store_id)?;
    let discounts = state
        .storage
        .discounts_by_store(&store_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(Json(discounts))
}

/// Resolve an active code for checkout. Inactive codes 404 like missing
/// ones.
pub async fn lookup(
    State(state): State<ServerState>,
    Path((store_id, code)): Path<(String, String)>,
) -> AppResult<Json<Discount>> {
    let discount = state
        .storage
        .get_discount(&store_id, &code)
        .map_err(|e| AppError::database(e.to_string()))?
        .filter(|d| d.active)
        .ok_or_else(|| AppError::not_found(format!("discount {code}")))?;
    Ok(Json(discount))
}
