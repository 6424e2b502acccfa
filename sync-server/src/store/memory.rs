//! MemStore — in-memory implementation of [`SyncStore`]
//!
//! Same observable semantics as `PgStore`, including the
//! duplicate-appointment insert outcome. Used by the engine test harness.

use std::sync::Mutex;

use async_trait::async_trait;

use shared::models::{
    CommissionAdjustment, CommissionTier, Order, ProviderUpdate, StylistProvider, SyncSettings,
    SyncSettingsUpdate, TierInput,
};

use super::{InsertOrderOutcome, StoreError, StoreResult, SyncStore};
use crate::payroll::PayPeriod;

#[derive(Default)]
struct Inner {
    settings: SyncSettings,
    providers: Vec<StylistProvider>,
    tiers: Vec<CommissionTier>,
    orders: Vec<Order>,
    adjustments: Vec<CommissionAdjustment>,
}

/// In-memory store for tests and same-process experiments
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the settings row (tests)
    pub fn with_settings(settings: SyncSettings) -> Self {
        let store = Self::new();
        store.inner.lock().unwrap().settings = settings;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Recorded commission adjustments (tests)
    pub fn adjustments(&self) -> Vec<CommissionAdjustment> {
        self.lock().adjustments.clone()
    }
}

#[async_trait]
impl SyncStore for MemStore {
    // ========== Settings ==========

    async fn get_settings(&self) -> StoreResult<SyncSettings> {
        Ok(self.lock().settings.clone())
    }

    async fn update_settings(
        &self,
        update: &SyncSettingsUpdate,
        now_ms: i64,
    ) -> StoreResult<SyncSettings> {
        let mut inner = self.lock();
        let settings = &mut inner.settings;
        if let Some(v) = update.sync_on_booked {
            settings.sync_on_booked = v;
        }
        if let Some(v) = update.sync_on_updated {
            settings.sync_on_updated = v;
        }
        if let Some(ref v) = update.default_order_tag {
            settings.default_order_tag = v.clone();
        }
        if let Some(ref v) = update.business_id {
            settings.business_id = Some(v.clone());
        }
        settings.updated_at = Some(now_ms);
        Ok(settings.clone())
    }

    // ========== Providers ==========

    async fn find_provider(&self, id: &str) -> StoreResult<Option<StylistProvider>> {
        Ok(self.lock().providers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_provider_by_external_id(
        &self,
        external_scheduling_id: &str,
    ) -> StoreResult<Option<StylistProvider>> {
        Ok(self
            .lock()
            .providers
            .iter()
            .find(|p| p.external_scheduling_id == external_scheduling_id)
            .cloned())
    }

    async fn list_providers(&self) -> StoreResult<Vec<StylistProvider>> {
        let mut providers = self.lock().providers.clone();
        providers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(providers)
    }

    async fn create_provider(&self, provider: &StylistProvider) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner
            .providers
            .iter()
            .any(|p| p.external_scheduling_id == provider.external_scheduling_id)
        {
            return Err(StoreError::Duplicate(format!(
                "Provider for scheduling id '{}'",
                provider.external_scheduling_id
            )));
        }
        inner.providers.push(provider.clone());
        Ok(())
    }

    async fn update_provider_identity(
        &self,
        id: &str,
        name: &str,
        role: Option<&str>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(provider) = inner.providers.iter_mut().find(|p| p.id == id) {
            provider.name = name.to_string();
            if let Some(role) = role {
                provider.role = Some(role.to_string());
            }
        }
        Ok(())
    }

    async fn update_provider(
        &self,
        id: &str,
        update: &ProviderUpdate,
    ) -> StoreResult<StylistProvider> {
        let mut inner = self.lock();
        let provider = inner
            .providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Provider {id}")))?;
        if let Some(ref v) = update.name {
            provider.name = v.clone();
        }
        if let Some(ref v) = update.role {
            provider.role = Some(v.clone());
        }
        if let Some(ref v) = update.external_staff_id {
            provider.external_staff_id = Some(v.clone());
        }
        if let Some(v) = update.commission_rate {
            provider.commission_rate = v;
        }
        if let Some(v) = update.hourly_rate {
            provider.hourly_rate = v;
        }
        if let Some(v) = update.enabled {
            provider.enabled = v;
        }
        Ok(provider.clone())
    }

    async fn set_provider_pin_hash(&self, id: &str, pin_hash: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        let provider = inner
            .providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Provider {id}")))?;
        provider.pin_hash = Some(pin_hash.to_string());
        Ok(())
    }

    // ========== Commission tiers ==========

    async fn list_tiers(&self, provider_id: &str) -> StoreResult<Vec<CommissionTier>> {
        let mut tiers: Vec<CommissionTier> = self
            .lock()
            .tiers
            .iter()
            .filter(|t| t.provider_id == provider_id)
            .cloned()
            .collect();
        tiers.sort_by(|a, b| a.sales_threshold.total_cmp(&b.sales_threshold));
        Ok(tiers)
    }

    async fn replace_tiers(
        &self,
        provider_id: &str,
        tiers: &[TierInput],
    ) -> StoreResult<Vec<CommissionTier>> {
        {
            let mut inner = self.lock();
            inner.tiers.retain(|t| t.provider_id != provider_id);
            for (i, tier) in tiers.iter().enumerate() {
                inner.tiers.push(CommissionTier {
                    id: format!("{provider_id}-tier-{i}"),
                    provider_id: provider_id.to_string(),
                    tier_level: tier.tier_level,
                    sales_threshold: tier.sales_threshold,
                    commission_rate: tier.commission_rate,
                });
            }
        }
        self.list_tiers(provider_id).await
    }

    // ========== Orders ==========

    async fn insert_order(&self, order: &Order) -> StoreResult<InsertOrderOutcome> {
        let mut inner = self.lock();
        if let Some(ref appointment_id) = order.appointment_id {
            let taken = inner
                .orders
                .iter()
                .any(|o| o.appointment_id.as_deref() == Some(appointment_id));
            if taken {
                return Ok(InsertOrderOutcome::DuplicateAppointment);
            }
        }
        inner.orders.push(order.clone());
        Ok(InsertOrderOutcome::Inserted)
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut inner = self.lock();
        let existing = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order.id)
            .ok_or_else(|| StoreError::NotFound(format!("Order {}", order.id)))?;
        *existing = order.clone();
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_order_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .find(|o| o.appointment_id.as_deref() == Some(appointment_id))
            .cloned())
    }

    async fn find_order_by_paid_sale(&self, paid_sale_id: &str) -> StoreResult<Option<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .find(|o| o.paid_sale_id.as_deref() == Some(paid_sale_id))
            .cloned())
    }

    async fn find_draft_orders_by_email(&self, email: &str) -> StoreResult<Vec<Order>> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|o| {
                o.status == shared::models::OrderStatus::Draft
                    && o.customer_email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned()
            .collect())
    }

    async fn period_sales(
        &self,
        provider_id: &str,
        period: PayPeriod,
        exclude_order_id: Option<&str>,
    ) -> StoreResult<f64> {
        Ok(self
            .lock()
            .orders
            .iter()
            .filter(|o| {
                o.provider_id == provider_id
                    && period.contains(o.appointment_at)
                    && o.status.is_active()
                    && Some(o.id.as_str()) != exclude_order_id
            })
            .map(|o| o.total_amount)
            .sum())
    }

    async fn list_orders(
        &self,
        provider_id: Option<&str>,
        period: Option<PayPeriod>,
    ) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .lock()
            .orders
            .iter()
            .filter(|o| provider_id.is_none_or(|p| o.provider_id == p))
            .filter(|o| period.is_none_or(|w| w.contains(o.appointment_at)))
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.appointment_at));
        Ok(orders)
    }

    // ========== Commission adjustments ==========

    async fn insert_adjustment(&self, adjustment: &CommissionAdjustment) -> StoreResult<()> {
        self.lock().adjustments.push(adjustment.clone());
        Ok(())
    }
}
