//! Order reconciliation engine
//!
//! Owns the order lifecycle: ingests scheduling booking/cancellation
//! events and commerce payment events, reconciles them into one durable
//! order per appointment, and drives draft-sale creation/cancellation in
//! the commerce platform.
//!
//! Idempotency: the storage layer's unique constraint on the appointment
//! id closes the check-then-create race — a conflicting insert falls back
//! to the update path, so duplicate deliveries never create a second
//! order. Commerce failures are logged and degrade processing; they never
//! fail an event.

pub mod blocked;
pub mod commission;
pub mod event;
pub mod identity;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use shared::models::{
    AdjustmentCreate, CommissionAdjustment, ManualOrderCreate, Order, OrderStatus, StylistProvider,
    SyncSettings, SyncSettingsUpdate,
};

use crate::commerce::{
    self, CommerceApi, DraftLineItem, DraftSaleRequest, PaidSaleEvent, matching,
};
use crate::payroll;
use crate::store::{InsertOrderOutcome, StoreError, SyncStore};

use event::{EventKind, NormalizedEvent};

/// Engine errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed request — rejected synchronously, no partial state
    #[error("{0}")]
    Validation(String),

    /// Invalid lifecycle transition requested
    #[error("{0}")]
    InvalidTransition(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of processing one inbound event — all handled outcomes,
/// including skips, are reported with HTTP 200
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created { order_id: String },
    Updated { order_id: String },
    Canceled { order_id: String },
    Deleted { order_id: String },
    Paid { order_id: String },
    Skipped { reason: String },
    NothingToCancel,
    NoMatch,
}

/// The order reconciliation state machine
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn SyncStore>,
    commerce: Arc<dyn CommerceApi>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn SyncStore>, commerce: Arc<dyn CommerceApi>) -> Self {
        Self { store, commerce }
    }

    // ========================================================================
    // Scheduling events
    // ========================================================================

    /// Ingest one raw scheduling webhook payload
    pub async fn handle_appointment_event(&self, raw: &Value) -> Result<SyncOutcome, SyncError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let settings = self.store.get_settings().await?;
        let event = event::normalize(raw, now_ms);

        match event.kind {
            EventKind::Cancellation { deleted } => {
                self.cancel_appointment(&event, deleted, now_ms).await
            }
            EventKind::Booking => self.upsert_appointment(&event, &settings, now_ms).await,
        }
    }

    async fn cancel_appointment(
        &self,
        event: &NormalizedEvent,
        deleted: bool,
        now_ms: i64,
    ) -> Result<SyncOutcome, SyncError> {
        let appointment_id = event.appointment_id.as_deref().ok_or_else(|| {
            SyncError::Validation("cancellation event carries no appointment id".to_string())
        })?;

        let Some(mut order) = self.store.find_order_by_appointment(appointment_id).await? else {
            tracing::info!(%appointment_id, "Nothing to cancel for appointment");
            return Ok(SyncOutcome::NothingToCancel);
        };

        // Repeating a cancellation is a no-op, not an error
        match order.status {
            OrderStatus::Canceled => {
                return Ok(SyncOutcome::Canceled { order_id: order.id });
            }
            OrderStatus::Deleted => {
                return Ok(SyncOutcome::Deleted { order_id: order.id });
            }
            _ => {}
        }

        self.discard_draft(&mut order).await;

        order.status = if deleted {
            OrderStatus::Deleted
        } else {
            OrderStatus::Canceled
        };
        order.voided_at = Some(now_ms);
        order.void_reason = Some(
            if deleted {
                "appointment deleted"
            } else {
                "appointment canceled"
            }
            .to_string(),
        );
        self.store.update_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            %appointment_id,
            status = %order.status,
            "Order voided from scheduling event"
        );

        Ok(if deleted {
            SyncOutcome::Deleted { order_id: order.id }
        } else {
            SyncOutcome::Canceled { order_id: order.id }
        })
    }

    async fn upsert_appointment(
        &self,
        event: &NormalizedEvent,
        settings: &SyncSettings,
        now_ms: i64,
    ) -> Result<SyncOutcome, SyncError> {
        let Some(appointment_id) = event.appointment_id.clone() else {
            return Ok(SyncOutcome::Skipped {
                reason: "no appointment id on event".to_string(),
            });
        };

        let existing = self.store.find_order_by_appointment(&appointment_id).await?;

        // Independent toggles for booking vs update synchronization
        if existing.is_none() && !settings.sync_on_booked {
            return Ok(SyncOutcome::Skipped {
                reason: "sync on booking is disabled".to_string(),
            });
        }
        if existing.is_some() && !settings.sync_on_updated {
            return Ok(SyncOutcome::Skipped {
                reason: "sync on update is disabled".to_string(),
            });
        }

        // Skip paths — informational, never errors
        let Some(provider_external_id) = event.service_provider_id.as_deref() else {
            return Ok(SyncOutcome::Skipped {
                reason: "no service provider on event".to_string(),
            });
        };
        let title = event.service_title.as_deref();
        if blocked::is_blocked(title, event.customer_id.as_deref()) {
            return Ok(SyncOutcome::Skipped {
                reason: format!("blocked time: {}", title.unwrap_or_default()),
            });
        }
        if event.customer_id.is_none() && !blocked::has_meaningful_title(title) {
            return Ok(SyncOutcome::Skipped {
                reason: "no customer and no service on event".to_string(),
            });
        }

        // Cache the business id the first time an event carries one
        if settings.business_id.is_none() {
            if let Some(business_id) = event.business_id.as_deref() {
                let update = SyncSettingsUpdate {
                    business_id: Some(business_id.to_string()),
                    ..Default::default()
                };
                if let Err(e) = self.store.update_settings(&update, now_ms).await {
                    tracing::warn!(error = %e, "Failed to cache business id");
                }
            }
        }

        let provider = identity::resolve_provider(
            &*self.store,
            provider_external_id,
            event.service_provider_name.as_deref(),
            None,
            now_ms,
        )
        .await?;
        if !provider.enabled {
            return Ok(SyncOutcome::Skipped {
                reason: format!("provider '{}' is disabled", provider.name),
            });
        }

        let total = commission::round2(event.total_amount);
        let commission_amount = self
            .resolve_commission(
                &provider,
                total,
                event.appointment_at,
                existing.as_ref().map(|o| o.id.as_str()),
            )
            .await?;

        if let Some(mut order) = existing {
            patch_order(&mut order, event, total, commission_amount);
            self.store.update_order(&order).await?;
            tracing::info!(order_id = %order.id, %appointment_id, "Order updated from booking event");
            return Ok(SyncOutcome::Updated { order_id: order.id });
        }

        // Create path: commerce side first, local persistence second.
        // A failed draft still yields a local order (no draft reference);
        // a lost insert race leaves at worst an orphaned external draft.
        let draft_sale_id = self
            .create_draft(settings, &provider.name, event, total)
            .await;

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id: Some(appointment_id.clone()),
            draft_sale_id,
            paid_sale_id: None,
            provider_id: provider.id.clone(),
            customer_name: event.customer_name.clone(),
            customer_email: event.customer_email.clone(),
            services: title.map(|t| vec![t.to_string()]).unwrap_or_default(),
            total_amount: total,
            tip_amount: 0.0,
            commission_amount,
            status: OrderStatus::Draft,
            appointment_at: event.appointment_at,
            created_at: now_ms,
            paid_at: None,
            voided_at: None,
            void_reason: None,
            is_manual: false,
        };

        match self.store.insert_order(&order).await? {
            InsertOrderOutcome::Inserted => {
                tracing::info!(
                    order_id = %order.id,
                    %appointment_id,
                    total_amount = total,
                    commission_amount,
                    "Order created from booking event"
                );
                Ok(SyncOutcome::Created { order_id: order.id })
            }
            InsertOrderOutcome::DuplicateAppointment => {
                // A concurrent delivery won the create race — treat this
                // one as the update it now is
                if let Some(draft_id) = order.draft_sale_id {
                    if let Err(e) = self.commerce.delete_draft_sale(&draft_id).await {
                        tracing::warn!(
                            error = %e,
                            draft_sale_id = %draft_id,
                            "Failed to clean up draft after losing create race"
                        );
                    }
                }
                let Some(mut winner) =
                    self.store.find_order_by_appointment(&appointment_id).await?
                else {
                    return Err(SyncError::Store(StoreError::Database(format!(
                        "Order for appointment '{appointment_id}' vanished after duplicate insert"
                    ))));
                };
                patch_order(&mut winner, event, total, commission_amount);
                self.store.update_order(&winner).await?;
                tracing::info!(order_id = %winner.id, %appointment_id, "Duplicate booking treated as update");
                Ok(SyncOutcome::Updated {
                    order_id: winner.id,
                })
            }
        }
    }

    // ========================================================================
    // Payment events
    // ========================================================================

    /// Ingest one paid-sale event from the commerce platform
    pub async fn handle_sale_event(&self, event: &PaidSaleEvent) -> Result<SyncOutcome, SyncError> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        let Some(mut order) = self.match_sale(event).await? else {
            tracing::info!(sale_id = %event.sale_id, "No local order matches paid sale");
            return Ok(SyncOutcome::NoMatch);
        };

        let provider = self
            .store
            .find_provider(&order.provider_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("Provider {}", order.provider_id))
            })?;

        // Recompute commission at the paid total — the tier in effect may
        // differ from the one applied at booking time
        let total = commission::round2(event.total_amount);
        order.total_amount = total;
        order.tip_amount = commission::round2(event.tip_amount);
        order.commission_amount = self
            .resolve_commission(&provider, total, order.appointment_at, Some(&order.id))
            .await?;
        order.paid_sale_id = Some(event.sale_id.clone());
        order.paid_at = Some(now_ms);
        order.status = OrderStatus::Paid;
        self.store.update_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            sale_id = %event.sale_id,
            total_amount = total,
            commission_amount = order.commission_amount,
            "Order paid"
        );
        Ok(SyncOutcome::Paid { order_id: order.id })
    }

    /// Match an inbound paid sale to a local order: stored paid-sale id
    /// first, then draft-origin sales by customer email (disambiguated by
    /// total within 0.01).
    async fn match_sale(&self, event: &PaidSaleEvent) -> Result<Option<Order>, SyncError> {
        if let Some(order) = self.store.find_order_by_paid_sale(&event.sale_id).await? {
            return Ok(Some(order));
        }

        if matching::source_is_draft(event.source.as_deref()) {
            if let Some(email) = event.customer_email.as_deref() {
                let candidates = self.store.find_draft_orders_by_email(email).await?;
                return Ok(matching::match_by_total(&candidates, event.total_amount).cloned());
            }
        }

        Ok(None)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Record a manually entered sale (no appointment correlation)
    pub async fn create_manual_order(
        &self,
        input: &ManualOrderCreate,
    ) -> Result<Order, SyncError> {
        if input.customer_name.trim().is_empty() {
            return Err(SyncError::Validation(
                "manual order requires a customer name".to_string(),
            ));
        }
        if input.total_amount <= 0.0 {
            return Err(SyncError::Validation(
                "manual order requires a positive amount".to_string(),
            ));
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let provider = self
            .store
            .find_provider(&input.provider_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("Provider {}", input.provider_id))
            })?;

        let appointment_at = input.appointment_at.unwrap_or(now_ms);
        let total = commission::round2(input.total_amount);
        let commission_amount = self
            .resolve_commission(&provider, total, appointment_at, None)
            .await?;

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id: None,
            draft_sale_id: None,
            paid_sale_id: None,
            provider_id: provider.id,
            customer_name: Some(input.customer_name.clone()),
            customer_email: input.customer_email.clone(),
            services: input.services.clone(),
            total_amount: total,
            tip_amount: commission::round2(input.tip_amount),
            commission_amount,
            status: OrderStatus::Draft,
            appointment_at,
            created_at: now_ms,
            paid_at: None,
            voided_at: None,
            void_reason: None,
            is_manual: true,
        };
        self.store.insert_order(&order).await?;
        Ok(order)
    }

    /// Void an order (admin). Repeats are no-ops.
    pub async fn void_order(&self, id: &str, reason: Option<&str>) -> Result<Order, SyncError> {
        let mut order = self.require_order(id).await?;
        if !order.status.is_active() {
            return Ok(order);
        }

        self.discard_draft(&mut order).await;
        order.status = OrderStatus::Canceled;
        order.voided_at = Some(chrono::Utc::now().timestamp_millis());
        order.void_reason = Some(reason.unwrap_or("voided by administrator").to_string());
        self.store.update_order(&order).await?;
        tracing::info!(order_id = %order.id, "Order voided by administrator");
        Ok(order)
    }

    /// Mark a draft as being checked out at the point of sale
    pub async fn begin_checkout(&self, id: &str) -> Result<Order, SyncError> {
        let mut order = self.require_order(id).await?;
        match order.status {
            OrderStatus::PendingCheckout => return Ok(order),
            OrderStatus::Draft => {}
            other => {
                return Err(SyncError::InvalidTransition(format!(
                    "only draft orders can enter checkout (status is {other})"
                )));
            }
        }

        order.status = OrderStatus::PendingCheckout;
        self.store.update_order(&order).await?;
        Ok(order)
    }

    /// Return a canceled/deleted order to draft (admin)
    pub async fn restore_order(&self, id: &str) -> Result<Order, SyncError> {
        let mut order = self.require_order(id).await?;
        if order.status.is_active() {
            return Err(SyncError::InvalidTransition(format!(
                "only canceled or deleted orders can be restored (status is {})",
                order.status
            )));
        }

        order.status = OrderStatus::Draft;
        order.voided_at = None;
        order.void_reason = None;
        self.store.update_order(&order).await?;
        tracing::info!(order_id = %order.id, "Order restored to draft");
        Ok(order)
    }

    /// Correct the appointment date (admin); the commission is re-derived
    /// against the new period's sales
    pub async fn set_appointment_date(
        &self,
        id: &str,
        appointment_at: i64,
    ) -> Result<Order, SyncError> {
        let mut order = self.require_order(id).await?;
        order.appointment_at = appointment_at;

        let provider = self
            .store
            .find_provider(&order.provider_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("Provider {}", order.provider_id))
            })?;
        order.commission_amount = self
            .resolve_commission(&provider, order.total_amount, appointment_at, Some(&order.id))
            .await?;

        self.store.update_order(&order).await?;
        Ok(order)
    }

    /// Apply an explicit commission adjustment — the only sanctioned way
    /// to move `commission_amount` off its derived value
    pub async fn adjust_commission(
        &self,
        id: &str,
        input: &AdjustmentCreate,
    ) -> Result<Order, SyncError> {
        if input.reason.trim().is_empty() {
            return Err(SyncError::Validation(
                "commission adjustment requires a reason".to_string(),
            ));
        }

        let mut order = self.require_order(id).await?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        let adjustment = CommissionAdjustment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            delta: input.delta,
            reason: input.reason.clone(),
            created_at: now_ms,
        };
        self.store.insert_adjustment(&adjustment).await?;

        order.commission_amount = commission::round2(order.commission_amount + input.delta);
        self.store.update_order(&order).await?;
        tracing::info!(
            order_id = %order.id,
            delta = input.delta,
            "Commission adjusted"
        );
        Ok(order)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn require_order(&self, id: &str) -> Result<Order, SyncError> {
        Ok(self
            .store
            .find_order(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Order {id}")))?)
    }

    /// Commission for a total at a given instant, from the provider's
    /// tier table against period-to-date sales (excluding the order being
    /// priced)
    async fn resolve_commission(
        &self,
        provider: &StylistProvider,
        total_amount: f64,
        at_ms: i64,
        exclude_order_id: Option<&str>,
    ) -> Result<f64, SyncError> {
        let period = payroll::period_for(at_ms);
        let period_sales = self
            .store
            .period_sales(&provider.id, period, exclude_order_id)
            .await?;
        let tiers = self.store.list_tiers(&provider.id).await?;
        let rate = commission::rate_for(provider.commission_rate, &tiers, period_sales);
        Ok(commission::commission_amount(total_amount, rate))
    }

    /// Best-effort deletion of the order's draft sale; the local
    /// cancellation proceeds regardless
    async fn discard_draft(&self, order: &mut Order) {
        if let Some(draft_id) = order.draft_sale_id.take() {
            if let Err(e) = self.commerce.delete_draft_sale(&draft_id).await {
                tracing::warn!(
                    error = %e,
                    draft_sale_id = %draft_id,
                    "Failed to delete draft sale; proceeding with local cancellation"
                );
            }
        }
    }

    /// Ensure a catalog product and create the draft sale. Every failure
    /// here is logged and degrades to a smaller draft or none at all.
    async fn create_draft(
        &self,
        settings: &SyncSettings,
        stylist_name: &str,
        event: &NormalizedEvent,
        total_amount: f64,
    ) -> Option<String> {
        let title = event
            .service_title
            .clone()
            .unwrap_or_else(|| blocked::GENERIC_SERVICE_TITLE.to_string());

        let (product_tags, variant_id) =
            match commerce::ensure_service_product(&*self.commerce, &title, total_amount).await {
                Ok(product) => (product.tags, product.variant_id),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        %title,
                        "Catalog lookup failed; draft will use a custom line item"
                    );
                    (Vec::new(), None)
                }
            };

        let mut tags = vec![
            settings.default_order_tag.clone(),
            format!("stylist:{stylist_name}"),
        ];
        tags.extend(product_tags);

        let draft = DraftSaleRequest {
            customer_name: event.customer_name.clone(),
            customer_email: event.customer_email.clone(),
            line_items: vec![DraftLineItem {
                title,
                price: total_amount,
                quantity: 1,
                variant_id,
            }],
            tags,
            note: event
                .appointment_id
                .as_ref()
                .map(|id| format!("Appointment {id}")),
        };

        match self.commerce.create_draft_sale(&draft).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Draft sale creation failed; order will carry no draft reference"
                );
                None
            }
        }
    }
}

/// Patch an existing order from a booking/update event
fn patch_order(order: &mut Order, event: &NormalizedEvent, total: f64, commission_amount: f64) {
    if event.customer_name.is_some() {
        order.customer_name = event.customer_name.clone();
    }
    if event.customer_email.is_some() {
        order.customer_email = event.customer_email.clone();
    }
    if let Some(title) = event.service_title.as_deref() {
        order.services = vec![title.to_string()];
    }
    order.total_amount = total;
    order.commission_amount = commission_amount;
    order.appointment_at = event.appointment_at;
}
