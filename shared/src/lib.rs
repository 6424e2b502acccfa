//! Shared types for the salon sync service
//!
//! Common types used across the workspace: data models, the unified
//! error type, and the API response envelope.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod error;
pub mod models;
pub mod response;

// Re-exports
pub use error::{AppError, AppResult};
pub use response::ApiResponse;
pub use serde::{Deserialize, Serialize};
