//! Scheduling webhook handler
//!
//! POST /webhooks/appointments — accepts the scheduling platform's
//! heterogeneous event shapes. Every handled outcome (including skips)
//! answers 200 with a JSON body; only unexpected internal failures
//! answer 500, leaving the event safely retryable upstream.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::Value;

use shared::error::AppError;

use crate::error::ServiceResult;
use crate::state::AppState;
use crate::sync::SyncOutcome;

const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

pub async fn handle_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> ServiceResult<Json<SyncOutcome>> {
    if let Some(expected) = state.config.scheduling_webhook_token.as_deref() {
        let provided = headers
            .get(WEBHOOK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            tracing::warn!("Scheduling webhook token mismatch");
            return Err(AppError::Unauthorized.into());
        }
    }

    let outcome = state.engine.handle_appointment_event(&raw).await?;
    Ok(Json(outcome))
}
