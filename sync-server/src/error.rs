//! Unified service-layer error type
//!
//! `ServiceError` bridges store/engine errors and the API-layer error
//! (`AppError`). It enables `?` propagation in handlers without manual
//! `.map_err(...)` boilerplate; database details are logged server-side
//! and never leak to the client.

use axum::response::IntoResponse;
use shared::error::AppError;

use crate::store::StoreError;
use crate::sync::SyncError;

/// Service-layer error
///
/// - `Db`: database/infrastructure errors (auto-logged, mapped to 500)
/// - `App`: business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    Db(String),
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(resource) => ServiceError::App(AppError::not_found(resource)),
            StoreError::Duplicate(resource) => ServiceError::App(AppError::conflict(resource)),
            StoreError::Database(message) => ServiceError::Db(message),
        }
    }
}

impl From<SyncError> for ServiceError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Validation(message) => ServiceError::App(AppError::validation(message)),
            SyncError::InvalidTransition(message) => {
                ServiceError::App(AppError::business_rule(message))
            }
            SyncError::Store(store) => store.into(),
        }
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::database(db_err)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
