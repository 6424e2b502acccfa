//! Sync Settings Model
//!
//! Process-wide synchronization configuration (singleton row). Loaded once
//! per request by the webhook handlers and never mutated in place by the
//! engine; only the admin settings endpoint writes it.

use serde::{Deserialize, Serialize};

/// Synchronization settings entity (singleton)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SyncSettings {
    /// Create orders for newly booked appointments
    pub sync_on_booked: bool,
    /// Apply update events to existing orders
    pub sync_on_updated: bool,
    /// Tag applied to every draft sale created by the engine
    pub default_order_tag: String,
    /// Cached commerce business id (discovered on first use)
    pub business_id: Option<String>,
    pub updated_at: Option<i64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            sync_on_booked: true,
            sync_on_updated: true,
            default_order_tag: "appointment".to_string(),
            business_id: None,
            updated_at: None,
        }
    }
}

/// Update settings payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_on_booked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_on_updated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_order_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
}
