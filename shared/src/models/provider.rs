//! Stylist Provider Model
//!
//! Identity + commission configuration. Exactly one provider per external
//! scheduling id; disabled providers are excluded from automatic sync but
//! retained for historical orders.

use serde::{Deserialize, Serialize};

/// Default flat commission rate (percent) for auto-provisioned providers
pub const DEFAULT_COMMISSION_RATE: f64 = 40.0;

/// Prefix used for generated names of providers seen before any real
/// name arrived. Re-sync only overwrites names carrying this prefix.
pub const UNKNOWN_PROVIDER_PREFIX: &str = "Unknown provider";

/// Generated placeholder name for a provider known only by external id
pub fn placeholder_name(external_scheduling_id: &str) -> String {
    format!("{UNKNOWN_PROVIDER_PREFIX} {external_scheduling_id}")
}

/// Stylist provider entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StylistProvider {
    pub id: String,
    /// External scheduling system id (unique)
    pub external_scheduling_id: String,
    /// External commerce staff id (POS linkage)
    pub external_staff_id: Option<String>,
    pub name: String,
    pub role: Option<String>,
    /// Flat commission rate (percent), the fallback below all tiers
    pub commission_rate: f64,
    /// Hourly rate in currency unit
    pub hourly_rate: f64,
    pub enabled: bool,
    /// Argon2 hash of the POS PIN
    #[serde(skip_serializing)]
    pub pin_hash: Option<String>,
    pub created_at: i64,
}

impl StylistProvider {
    /// True when the stored name is a generated placeholder
    pub fn has_placeholder_name(&self) -> bool {
        self.name.starts_with(UNKNOWN_PROVIDER_PREFIX)
    }
}

#[cfg(feature = "auth")]
impl StylistProvider {
    /// Verify a POS PIN using argon2
    pub fn verify_pin(&self, pin: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let Some(ref hash) = self.pin_hash else {
            return Ok(false);
        };
        let parsed_hash = PasswordHash::new(hash)?;
        Ok(Argon2::default()
            .verify_password(pin.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a POS PIN using argon2
    pub fn hash_pin(pin: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let pin_hash = argon2.hash_password(pin.as_bytes(), &salt)?;
        Ok(pin_hash.to_string())
    }
}

/// Update provider payload (admin)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_staff_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Commission tier — (threshold, rate) pair belonging to a provider.
/// The greatest threshold not exceeding period sales determines the rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CommissionTier {
    pub id: String,
    pub provider_id: String,
    pub tier_level: i32,
    /// Period sales threshold in currency unit
    pub sales_threshold: f64,
    /// Commission rate (percent) at this tier
    pub commission_rate: f64,
}

/// Tier replacement payload (admin) — the full ordered list for a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierInput {
    pub tier_level: i32,
    pub sales_threshold: f64,
    pub commission_rate: f64,
}
