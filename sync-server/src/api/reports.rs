//! Commission report handlers
//!
//! Per-provider totals for one pay period — the payout input consumed by
//! hour tracking.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::error::ServiceResult;
use crate::payroll::{self, PayPeriod};
use crate::state::AppState;
use crate::sync::commission::round2;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Any instant within the pay period to report on (Unix millis);
    /// defaults to now
    pub at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CommissionReportRow {
    pub provider_id: String,
    pub provider_name: String,
    pub order_count: usize,
    pub total_sales: f64,
    pub total_tips: f64,
    pub total_commission: f64,
}

#[derive(Debug, Serialize)]
pub struct CommissionReport {
    pub period: PayPeriod,
    pub rows: Vec<CommissionReportRow>,
}

pub async fn commissions(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ServiceResult<Json<CommissionReport>> {
    let at = query
        .at
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
    let period = payroll::period_for(at);

    let providers = state.store.list_providers().await?;
    let orders = state.store.list_orders(None, Some(period)).await?;

    let rows = providers
        .into_iter()
        .map(|provider| {
            let mut order_count = 0;
            let mut total_sales = 0.0;
            let mut total_tips = 0.0;
            let mut total_commission = 0.0;
            for order in orders.iter().filter(|o| {
                o.provider_id == provider.id && o.status.is_active()
            }) {
                order_count += 1;
                total_sales += order.total_amount;
                total_tips += order.tip_amount;
                total_commission += order.commission_amount;
            }
            CommissionReportRow {
                provider_id: provider.id,
                provider_name: provider.name,
                order_count,
                total_sales: round2(total_sales),
                total_tips: round2(total_tips),
                total_commission: round2(total_commission),
            }
        })
        .collect();

    Ok(Json(CommissionReport { period, rows }))
}
