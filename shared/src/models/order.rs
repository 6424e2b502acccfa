//! Order Model
//!
//! One durable row per reconciled appointment (or manual sale). Rows are
//! never physically removed — cancellation and deletion are status values.

use serde::{Deserialize, Serialize};

/// Order status lifecycle
///
/// `draft → pending_checkout → paid`; `draft|pending_checkout →
/// canceled|deleted`; `canceled|deleted → draft` via explicit restore only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    PendingCheckout,
    Paid,
    Canceled,
    Deleted,
}

impl OrderStatus {
    /// Database/text representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingCheckout => "pending_checkout",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
            Self::Deleted => "deleted",
        }
    }

    /// Counts toward period sales (not voided in any form)
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Canceled | Self::Deleted)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "pending_checkout" => Ok(Self::PendingCheckout),
            "paid" => Ok(Self::Paid),
            "canceled" => Ok(Self::Canceled),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// External scheduling appointment id (unique; None only for manual sales)
    pub appointment_id: Option<String>,
    /// Draft sale id in the commerce platform (cleared on cancellation)
    pub draft_sale_id: Option<String>,
    /// Paid sale id in the commerce platform (set on payment)
    pub paid_sale_id: Option<String>,
    pub provider_id: String,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    /// Service names, in booking order
    pub services: Vec<String>,
    /// Amount in currency unit
    pub total_amount: f64,
    /// Tip in currency unit
    pub tip_amount: f64,
    /// Commission in currency unit, always derived from `total_amount`
    /// and the rate in effect at computation time
    pub commission_amount: f64,
    pub status: OrderStatus,
    /// Appointment instant (Unix millis); drives pay-period attribution
    pub appointment_at: i64,
    pub created_at: i64,
    pub paid_at: Option<i64>,
    pub voided_at: Option<i64>,
    pub void_reason: Option<String>,
    /// Entered by an administrator rather than synchronized
    pub is_manual: bool,
}

/// Manual order entry payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualOrderCreate {
    pub provider_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    pub total_amount: f64,
    #[serde(default)]
    pub tip_amount: f64,
    /// Defaults to the entry instant when omitted
    pub appointment_at: Option<i64>,
}

/// Explicit commission adjustment — the only path that may move
/// `commission_amount` away from its derived value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CommissionAdjustment {
    pub id: String,
    pub order_id: String,
    /// Signed delta in currency unit
    pub delta: f64,
    pub reason: String,
    pub created_at: i64,
}

/// Commission adjustment payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentCreate {
    pub delta: f64,
    pub reason: String,
}
