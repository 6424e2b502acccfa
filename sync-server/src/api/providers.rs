//! Provider admin handlers

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use shared::error::AppError;
use shared::models::{CommissionTier, ProviderUpdate, StylistProvider, TierInput};

use crate::error::ServiceResult;
use crate::state::AppState;
use crate::sync::commission::money_eq;

/// List all providers, enabled and disabled
pub async fn list(State(state): State<AppState>) -> ServiceResult<Json<Vec<StylistProvider>>> {
    let providers = state.store.list_providers().await?;
    Ok(Json(providers))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProviderUpdate>,
) -> ServiceResult<Json<StylistProvider>> {
    if let Some(rate) = payload.commission_rate {
        if !(0.0..=100.0).contains(&rate) {
            return Err(AppError::validation("commission_rate must be between 0 and 100").into());
        }
    }
    let provider = state.store.update_provider(&id, &payload).await?;
    Ok(Json(provider))
}

pub async fn list_tiers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Vec<CommissionTier>>> {
    let tiers = state.store.list_tiers(&id).await?;
    Ok(Json(tiers))
}

/// Replace a provider's full tier table
pub async fn replace_tiers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<Vec<TierInput>>,
) -> ServiceResult<Json<Vec<CommissionTier>>> {
    for tier in &payload {
        if tier.sales_threshold < 0.0 {
            return Err(AppError::validation("sales_threshold must be non-negative").into());
        }
        if !(0.0..=100.0).contains(&tier.commission_rate) {
            return Err(AppError::validation("commission_rate must be between 0 and 100").into());
        }
    }
    for (i, a) in payload.iter().enumerate() {
        if payload[i + 1..]
            .iter()
            .any(|b| money_eq(a.sales_threshold, b.sales_threshold))
        {
            return Err(AppError::validation("duplicate sales_threshold in tier list").into());
        }
    }

    let mut tiers = payload;
    tiers.sort_by(|a, b| a.sales_threshold.total_cmp(&b.sales_threshold));
    let stored = state.store.replace_tiers(&id, &tiers).await?;
    Ok(Json(stored))
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub pin: String,
}

/// Set the provider's POS PIN (stored as an argon2 hash)
pub async fn set_pin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PinRequest>,
) -> ServiceResult<Json<bool>> {
    let pin = payload.pin.trim();
    if pin.len() < 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("PIN must be at least 4 digits").into());
    }

    let pin_hash = StylistProvider::hash_pin(pin)
        .map_err(|e| AppError::internal(format!("Failed to hash PIN: {e}")))?;
    state.store.set_provider_pin_hash(&id, &pin_hash).await?;
    Ok(Json(true))
}
