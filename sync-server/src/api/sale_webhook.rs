//! Commerce payment webhook handler
//!
//! POST /webhooks/sales — handles paid-sale events. Must receive the raw
//! body (not JSON) for HMAC signature verification.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::Value;

use shared::error::AppError;

use crate::commerce::{PaidSaleEvent, verify_webhook_signature};
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::sync::SyncOutcome;

const SIGNATURE_HEADER: &str = "x-commerce-signature";

pub async fn handle_sale(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ServiceResult<Json<SyncOutcome>> {
    let sig_header = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("Missing signature header"))?;

    if let Err(e) =
        verify_webhook_signature(&body, sig_header, &state.config.commerce_webhook_secret)
    {
        tracing::warn!(error = e, "Sale webhook signature verification failed");
        return Err(AppError::validation(e).into());
    }

    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid JSON payload: {e}")))?;
    let event = PaidSaleEvent::from_value(&raw)
        .ok_or_else(|| AppError::validation("Sale event carries no id"))?;

    let outcome = state.engine.handle_sale_event(&event).await?;
    Ok(Json(outcome))
}
