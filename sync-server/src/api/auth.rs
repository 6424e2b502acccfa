//! Admin authorization middleware
//!
//! Session issuance lives in an external identity collaborator; this
//! service only consumes an "authorized to mutate" capability, expressed
//! as a bearer token check.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use shared::error::AppError;

use crate::state::AppState;

/// Reject requests without the configured admin bearer token
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.config.admin_token);

    if !authorized {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
