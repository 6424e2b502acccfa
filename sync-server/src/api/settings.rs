//! Sync settings handlers

use axum::Json;
use axum::extract::State;

use shared::models::{SyncSettings, SyncSettingsUpdate};

use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn get(State(state): State<AppState>) -> ServiceResult<Json<SyncSettings>> {
    let settings = state.store.get_settings().await?;
    Ok(Json(settings))
}

pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<SyncSettingsUpdate>,
) -> ServiceResult<Json<SyncSettings>> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let settings = state.store.update_settings(&payload, now_ms).await?;
    Ok(Json(settings))
}
