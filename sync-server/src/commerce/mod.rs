//! Commerce platform bridge
//!
//! Catalog and sale operations against the external commerce platform,
//! behind the pluggable [`CommerceApi`] trait: the production
//! implementation is the HTTP [`client::CommerceClient`]; tests plug in a
//! recording mock. All bridge failures are recoverable — callers log and
//! continue with degraded data.

pub mod client;
pub mod matching;

pub use client::CommerceClient;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

/// Commerce call errors — always treated as recoverable by callers
#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("Commerce request failed: {0}")]
    Http(String),

    #[error("Commerce API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode commerce response: {0}")]
    Decode(String),
}

/// A sellable catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub tags: Vec<String>,
    /// First variant id; None degrades to a custom, untracked line item
    pub variant_id: Option<String>,
}

/// One line of a draft sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLineItem {
    pub title: String,
    pub price: f64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
}

/// Draft sale creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSaleRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub line_items: Vec<DraftLineItem>,
    pub tags: Vec<String>,
    pub note: Option<String>,
}

/// Commerce platform operations used by the sync engine
#[async_trait]
pub trait CommerceApi: Send + Sync {
    /// Search the catalog by product title
    async fn search_products(&self, title: &str) -> Result<Vec<CatalogProduct>, CommerceError>;

    /// Create a catalog product
    async fn create_product(&self, title: &str, price: f64)
    -> Result<CatalogProduct, CommerceError>;

    /// Create a draft sale, returning its id
    async fn create_draft_sale(&self, draft: &DraftSaleRequest) -> Result<String, CommerceError>;

    /// Delete a draft sale (callers treat failure as best-effort)
    async fn delete_draft_sale(&self, draft_sale_id: &str) -> Result<(), CommerceError>;
}

/// Ensure a sellable catalog item exists for the given service title:
/// prefer an existing match (see [`matching::pick_product`]), otherwise
/// create a new product with that title and price.
pub async fn ensure_service_product(
    api: &dyn CommerceApi,
    title: &str,
    price: f64,
) -> Result<CatalogProduct, CommerceError> {
    let results = api.search_products(title).await?;
    if let Some(product) = matching::pick_product(&results, title) {
        return Ok(product.clone());
    }
    api.create_product(title, price).await
}

/// Inbound paid-sale event from the commerce webhook
#[derive(Debug, Clone)]
pub struct PaidSaleEvent {
    pub sale_id: String,
    pub total_amount: f64,
    pub tip_amount: f64,
    pub line_titles: Vec<String>,
    /// Source indicator ("draft_order" marks conversion from a draft)
    pub source: Option<String>,
    pub customer_email: Option<String>,
    pub staff_id: Option<String>,
}

impl PaidSaleEvent {
    /// Extract from a raw webhook body. Returns None when the payload
    /// carries no sale id.
    pub fn from_value(raw: &Value) -> Option<Self> {
        let sale_id = scalar_string(raw, &["id", "sale_id"])?;

        let total_amount = amount(raw, &["total_amount", "total_price", "total"]).unwrap_or(0.0);
        let tip_amount = amount(raw, &["tip_amount", "total_tip", "total_tip_received"])
            .unwrap_or(0.0);

        let line_titles = raw
            .get("line_items")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| scalar_string(item, &["title", "name"]))
                    .collect()
            })
            .unwrap_or_default();

        let customer_email = scalar_string(raw, &["customer_email", "email"]).or_else(|| {
            raw.get("customer")
                .and_then(|c| scalar_string(c, &["email"]))
        });

        Some(Self {
            sale_id,
            total_amount,
            tip_amount,
            line_titles,
            source: scalar_string(raw, &["source", "source_name"]),
            customer_email,
            staff_id: scalar_string(raw, &["staff_id", "user_id"]),
        })
    }
}

fn scalar_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn amount(value: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match value.get(*key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => return s.trim().parse().ok(),
            _ => {}
        }
    }
    None
}

/// Replay window for webhook signatures
const SIGNATURE_MAX_AGE_SECS: i64 = 300;

/// Verify the commerce webhook signature (HMAC-SHA256)
///
/// Header format: `t=<unix seconds>,v1=<hex hmac>` over `"{t}.{body}"`.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    // Constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    // Reject stale events to prevent replay
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > SIGNATURE_MAX_AGE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}
