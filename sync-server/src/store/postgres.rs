//! PgStore — PostgreSQL implementation of [`SyncStore`]
//!
//! Plain runtime-bound queries against the schema in `migrations/`. The
//! unique index on `orders.appointment_id` is what makes `insert_order`
//! idempotent under concurrent duplicate deliveries: the conflicting
//! insert affects zero rows and the caller falls back to the update path.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use shared::models::{
    CommissionAdjustment, CommissionTier, Order, OrderStatus, ProviderUpdate, StylistProvider,
    SyncSettings, SyncSettingsUpdate, TierInput,
};

use super::{InsertOrderOutcome, StoreError, StoreResult, SyncStore};
use crate::payroll::PayPeriod;

const ORDER_COLUMNS: &str = "id, appointment_id, draft_sale_id, paid_sale_id, provider_id, \
     customer_name, customer_email, services, total_amount, tip_amount, commission_amount, \
     status, appointment_at, created_at, paid_at, voided_at, void_reason, is_manual";

const PROVIDER_COLUMNS: &str = "id, external_scheduling_id, external_staff_id, name, role, \
     commission_rate, hourly_rate, enabled, pin_hash, created_at";

/// Order row as stored (status as text, services as JSONB)
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    appointment_id: Option<String>,
    draft_sale_id: Option<String>,
    paid_sale_id: Option<String>,
    provider_id: String,
    customer_name: Option<String>,
    customer_email: Option<String>,
    services: Json<Vec<String>>,
    total_amount: f64,
    tip_amount: f64,
    commission_amount: f64,
    status: String,
    appointment_at: i64,
    created_at: i64,
    paid_at: Option<i64>,
    voided_at: Option<i64>,
    void_reason: Option<String>,
    is_manual: bool,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, StoreError> {
        Ok(Order {
            status: OrderStatus::try_from(row.status).map_err(StoreError::Database)?,
            id: row.id,
            appointment_id: row.appointment_id,
            draft_sale_id: row.draft_sale_id,
            paid_sale_id: row.paid_sale_id,
            provider_id: row.provider_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            services: row.services.0,
            total_amount: row.total_amount,
            tip_amount: row.tip_amount,
            commission_amount: row.commission_amount,
            appointment_at: row.appointment_at,
            created_at: row.created_at,
            paid_at: row.paid_at,
            voided_at: row.voided_at,
            void_reason: row.void_reason,
            is_manual: row.is_manual,
        })
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgStore {
    // ========== Settings ==========

    async fn get_settings(&self) -> StoreResult<SyncSettings> {
        let settings: Option<SyncSettings> = sqlx::query_as(
            "SELECT sync_on_booked, sync_on_updated, default_order_tag, business_id, updated_at
             FROM sync_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(settings.unwrap_or_default())
    }

    async fn update_settings(
        &self,
        update: &SyncSettingsUpdate,
        now_ms: i64,
    ) -> StoreResult<SyncSettings> {
        sqlx::query(
            "UPDATE sync_settings SET
                sync_on_booked = COALESCE($1, sync_on_booked),
                sync_on_updated = COALESCE($2, sync_on_updated),
                default_order_tag = COALESCE($3, default_order_tag),
                business_id = COALESCE($4, business_id),
                updated_at = $5
             WHERE id = 1",
        )
        .bind(update.sync_on_booked)
        .bind(update.sync_on_updated)
        .bind(update.default_order_tag.as_deref())
        .bind(update.business_id.as_deref())
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        self.get_settings().await
    }

    // ========== Providers ==========

    async fn find_provider(&self, id: &str) -> StoreResult<Option<StylistProvider>> {
        let provider = sqlx::query_as(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM stylist_providers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(provider)
    }

    async fn find_provider_by_external_id(
        &self,
        external_scheduling_id: &str,
    ) -> StoreResult<Option<StylistProvider>> {
        let provider = sqlx::query_as(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM stylist_providers WHERE external_scheduling_id = $1"
        ))
        .bind(external_scheduling_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(provider)
    }

    async fn list_providers(&self) -> StoreResult<Vec<StylistProvider>> {
        let providers = sqlx::query_as(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM stylist_providers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(providers)
    }

    async fn create_provider(&self, provider: &StylistProvider) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO stylist_providers
                (id, external_scheduling_id, external_staff_id, name, role,
                 commission_rate, hourly_rate, enabled, pin_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (external_scheduling_id) DO NOTHING",
        )
        .bind(&provider.id)
        .bind(&provider.external_scheduling_id)
        .bind(provider.external_staff_id.as_deref())
        .bind(&provider.name)
        .bind(provider.role.as_deref())
        .bind(provider.commission_rate)
        .bind(provider.hourly_rate)
        .bind(provider.enabled)
        .bind(provider.pin_hash.as_deref())
        .bind(provider.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(format!(
                "Provider for scheduling id '{}'",
                provider.external_scheduling_id
            )));
        }
        Ok(())
    }

    async fn update_provider_identity(
        &self,
        id: &str,
        name: &str,
        role: Option<&str>,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE stylist_providers SET name = $1, role = COALESCE($2, role) WHERE id = $3")
            .bind(name)
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_provider(
        &self,
        id: &str,
        update: &ProviderUpdate,
    ) -> StoreResult<StylistProvider> {
        sqlx::query(
            "UPDATE stylist_providers SET
                name = COALESCE($1, name),
                role = COALESCE($2, role),
                external_staff_id = COALESCE($3, external_staff_id),
                commission_rate = COALESCE($4, commission_rate),
                hourly_rate = COALESCE($5, hourly_rate),
                enabled = COALESCE($6, enabled)
             WHERE id = $7",
        )
        .bind(update.name.as_deref())
        .bind(update.role.as_deref())
        .bind(update.external_staff_id.as_deref())
        .bind(update.commission_rate)
        .bind(update.hourly_rate)
        .bind(update.enabled)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.find_provider(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Provider {id}")))
    }

    async fn set_provider_pin_hash(&self, id: &str, pin_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE stylist_providers SET pin_hash = $1 WHERE id = $2")
            .bind(pin_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Provider {id}")));
        }
        Ok(())
    }

    // ========== Commission tiers ==========

    async fn list_tiers(&self, provider_id: &str) -> StoreResult<Vec<CommissionTier>> {
        let tiers = sqlx::query_as(
            "SELECT id, provider_id, tier_level, sales_threshold, commission_rate
             FROM commission_tiers WHERE provider_id = $1
             ORDER BY sales_threshold ASC",
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }

    async fn replace_tiers(
        &self,
        provider_id: &str,
        tiers: &[TierInput],
    ) -> StoreResult<Vec<CommissionTier>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM commission_tiers WHERE provider_id = $1")
            .bind(provider_id)
            .execute(&mut *tx)
            .await?;

        for tier in tiers {
            sqlx::query(
                "INSERT INTO commission_tiers
                    (id, provider_id, tier_level, sales_threshold, commission_rate)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(provider_id)
            .bind(tier.tier_level)
            .bind(tier.sales_threshold)
            .bind(tier.commission_rate)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.list_tiers(provider_id).await
    }

    // ========== Orders ==========

    async fn insert_order(&self, order: &Order) -> StoreResult<InsertOrderOutcome> {
        let result = sqlx::query(
            "INSERT INTO orders
                (id, appointment_id, draft_sale_id, paid_sale_id, provider_id,
                 customer_name, customer_email, services, total_amount, tip_amount,
                 commission_amount, status, appointment_at, created_at, paid_at,
                 voided_at, void_reason, is_manual)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             ON CONFLICT (appointment_id) DO NOTHING",
        )
        .bind(&order.id)
        .bind(order.appointment_id.as_deref())
        .bind(order.draft_sale_id.as_deref())
        .bind(order.paid_sale_id.as_deref())
        .bind(&order.provider_id)
        .bind(order.customer_name.as_deref())
        .bind(order.customer_email.as_deref())
        .bind(Json(&order.services))
        .bind(order.total_amount)
        .bind(order.tip_amount)
        .bind(order.commission_amount)
        .bind(order.status.as_str())
        .bind(order.appointment_at)
        .bind(order.created_at)
        .bind(order.paid_at)
        .bind(order.voided_at)
        .bind(order.void_reason.as_deref())
        .bind(order.is_manual)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOrderOutcome::DuplicateAppointment)
        } else {
            Ok(InsertOrderOutcome::Inserted)
        }
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET
                draft_sale_id = $1, paid_sale_id = $2, customer_name = $3,
                customer_email = $4, services = $5, total_amount = $6, tip_amount = $7,
                commission_amount = $8, status = $9, appointment_at = $10, paid_at = $11,
                voided_at = $12, void_reason = $13
             WHERE id = $14",
        )
        .bind(order.draft_sale_id.as_deref())
        .bind(order.paid_sale_id.as_deref())
        .bind(order.customer_name.as_deref())
        .bind(order.customer_email.as_deref())
        .bind(Json(&order.services))
        .bind(order.total_amount)
        .bind(order.tip_amount)
        .bind(order.commission_amount)
        .bind(order.status.as_str())
        .bind(order.appointment_at)
        .bind(order.paid_at)
        .bind(order.voided_at)
        .bind(order.void_reason.as_deref())
        .bind(&order.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Order {}", order.id)));
        }
        Ok(())
    }

    async fn find_order(&self, id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_order_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE appointment_id = $1"
        ))
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_order_by_paid_sale(&self, paid_sale_id: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE paid_sale_id = $1"
        ))
        .bind(paid_sale_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_draft_orders_by_email(&self, email: &str) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE status = 'draft' AND lower(customer_email) = lower($1)
             ORDER BY created_at"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn period_sales(
        &self,
        provider_id: &str,
        period: PayPeriod,
        exclude_order_id: Option<&str>,
    ) -> StoreResult<f64> {
        let row: (f64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(total_amount), 0)::double precision FROM orders
             WHERE provider_id = $1
               AND appointment_at >= $2 AND appointment_at < $3
               AND status NOT IN ('canceled', 'deleted')
               AND ($4::text IS NULL OR id <> $4)",
        )
        .bind(provider_id)
        .bind(period.start_ms)
        .bind(period.end_ms)
        .bind(exclude_order_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn list_orders(
        &self,
        provider_id: Option<&str>,
        period: Option<PayPeriod>,
    ) -> StoreResult<Vec<Order>> {
        let (start, end) = match period {
            Some(p) => (Some(p.start_ms), Some(p.end_ms)),
            None => (None, None),
        };
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ($1::text IS NULL OR provider_id = $1)
               AND ($2::bigint IS NULL OR appointment_at >= $2)
               AND ($3::bigint IS NULL OR appointment_at < $3)
             ORDER BY appointment_at DESC"
        ))
        .bind(provider_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    // ========== Commission adjustments ==========

    async fn insert_adjustment(&self, adjustment: &CommissionAdjustment) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO commission_adjustments (id, order_id, delta, reason, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&adjustment.id)
        .bind(&adjustment.order_id)
        .bind(adjustment.delta)
        .bind(&adjustment.reason)
        .bind(adjustment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
