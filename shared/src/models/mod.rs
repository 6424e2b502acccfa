//! Data models
//!
//! Shared between the sync server and the admin API consumers.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All timestamps are `i64` Unix milliseconds; all ids are opaque strings.

pub mod order;
pub mod provider;
pub mod settings;

// Re-exports
pub use order::*;
pub use provider::*;
pub use settings::*;
