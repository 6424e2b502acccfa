//! Persistence layer
//!
//! The engine and the admin API talk to storage through the [`SyncStore`]
//! trait: a transactional key-value-ish abstraction over orders,
//! providers, tiers and settings. Production uses [`postgres::PgStore`];
//! tests use [`memory::MemStore`].

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use shared::models::{
    CommissionAdjustment, CommissionTier, Order, ProviderUpdate, StylistProvider, SyncSettings,
    SyncSettingsUpdate, TierInput,
};

use crate::payroll::PayPeriod;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an idempotent order insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOrderOutcome {
    Inserted,
    /// An order for this appointment id already exists — the caller must
    /// fall back to the update path
    DuplicateAppointment,
}

/// Storage operations for the synchronization engine and admin API
#[async_trait]
pub trait SyncStore: Send + Sync {
    // ========== Settings ==========

    async fn get_settings(&self) -> StoreResult<SyncSettings>;
    async fn update_settings(
        &self,
        update: &SyncSettingsUpdate,
        now_ms: i64,
    ) -> StoreResult<SyncSettings>;

    // ========== Providers ==========

    async fn find_provider(&self, id: &str) -> StoreResult<Option<StylistProvider>>;
    /// Lookup by external scheduling id, enabled or not
    async fn find_provider_by_external_id(
        &self,
        external_scheduling_id: &str,
    ) -> StoreResult<Option<StylistProvider>>;
    async fn list_providers(&self) -> StoreResult<Vec<StylistProvider>>;
    /// Fails with `Duplicate` when the external scheduling id is taken
    async fn create_provider(&self, provider: &StylistProvider) -> StoreResult<()>;
    /// Overwrite name/role only, leaving rate and enabled untouched
    async fn update_provider_identity(
        &self,
        id: &str,
        name: &str,
        role: Option<&str>,
    ) -> StoreResult<()>;
    async fn update_provider(
        &self,
        id: &str,
        update: &ProviderUpdate,
    ) -> StoreResult<StylistProvider>;
    async fn set_provider_pin_hash(&self, id: &str, pin_hash: &str) -> StoreResult<()>;

    // ========== Commission tiers ==========

    /// Tiers for a provider, ascending by threshold
    async fn list_tiers(&self, provider_id: &str) -> StoreResult<Vec<CommissionTier>>;
    async fn replace_tiers(
        &self,
        provider_id: &str,
        tiers: &[TierInput],
    ) -> StoreResult<Vec<CommissionTier>>;

    // ========== Orders ==========

    /// Idempotent insert: the unique constraint on the appointment id
    /// turns a concurrent duplicate into `DuplicateAppointment`
    async fn insert_order(&self, order: &Order) -> StoreResult<InsertOrderOutcome>;
    async fn update_order(&self, order: &Order) -> StoreResult<()>;
    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn find_order_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Order>>;
    async fn find_order_by_paid_sale(&self, paid_sale_id: &str) -> StoreResult<Option<Order>>;
    async fn find_draft_orders_by_email(&self, email: &str) -> StoreResult<Vec<Order>>;
    /// Sum of active (non-canceled, non-deleted) order totals for the
    /// provider whose appointment falls in the period, excluding the
    /// order currently being priced
    async fn period_sales(
        &self,
        provider_id: &str,
        period: PayPeriod,
        exclude_order_id: Option<&str>,
    ) -> StoreResult<f64>;
    async fn list_orders(
        &self,
        provider_id: Option<&str>,
        period: Option<PayPeriod>,
    ) -> StoreResult<Vec<Order>>;

    // ========== Commission adjustments ==========

    async fn insert_adjustment(&self, adjustment: &CommissionAdjustment) -> StoreResult<()>;
}
