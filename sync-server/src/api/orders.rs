//! Order admin handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use shared::error::AppError;
use shared::models::{AdjustmentCreate, ManualOrderCreate, Order};

use crate::error::ServiceResult;
use crate::payroll;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub provider_id: Option<String>,
    /// Any instant within the pay period to list (Unix millis)
    pub at: Option<i64>,
}

/// List orders, optionally narrowed to a provider and/or a pay period
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ServiceResult<Json<Vec<Order>>> {
    let period = query.at.map(payroll::period_for);
    let orders = state
        .store
        .list_orders(query.provider_id.as_deref(), period)
        .await?;
    Ok(Json(orders))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Order>> {
    let order = state
        .store
        .find_order(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    Ok(Json(order))
}

/// Record a manually entered sale
pub async fn create_manual(
    State(state): State<AppState>,
    Json(payload): Json<ManualOrderCreate>,
) -> ServiceResult<Json<Order>> {
    let order = state.engine.create_manual_order(&payload).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize, Default)]
pub struct VoidRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn void(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<VoidRequest>,
) -> ServiceResult<Json<Order>> {
    let order = state
        .engine
        .void_order(&id, payload.reason.as_deref())
        .await?;
    Ok(Json(order))
}

/// Mark a draft as entering checkout (called by the POS plugin)
pub async fn begin_checkout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Order>> {
    let order = state.engine.begin_checkout(&id).await?;
    Ok(Json(order))
}

pub async fn restore(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Order>> {
    let order = state.engine.restore_order(&id).await?;
    Ok(Json(order))
}

#[derive(Debug, Deserialize)]
pub struct AppointmentDateRequest {
    /// Corrected appointment instant (Unix millis)
    pub appointment_at: i64,
}

pub async fn set_appointment_date(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AppointmentDateRequest>,
) -> ServiceResult<Json<Order>> {
    let order = state
        .engine
        .set_appointment_date(&id, payload.appointment_at)
        .await?;
    Ok(Json(order))
}

pub async fn adjust_commission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AdjustmentCreate>,
) -> ServiceResult<Json<Order>> {
    let order = state.engine.adjust_commission(&id, &payload).await?;
    Ok(Json(order))
}
