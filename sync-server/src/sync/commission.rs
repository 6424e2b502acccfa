//! Commission and money math
//!
//! All monetary arithmetic runs through `rust_decimal`; `f64` only at the
//! model/storage boundary, rounded to 2 decimal places half-up.

use rust_decimal::prelude::*;
use shared::models::CommissionTier;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a monetary value to 2 decimal places (half-up)
#[inline]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

/// Resolve the commission rate (percent) for the given period-to-date
/// sales figure.
///
/// Tiers must be sorted ascending by threshold; the tier with the
/// greatest threshold not exceeding `period_sales` wins. When no tier
/// qualifies (sales below the lowest threshold, or no tiers configured),
/// the provider's flat rate applies.
///
/// `period_sales` must exclude voided/canceled orders and the order
/// currently being priced.
pub fn rate_for(flat_rate: f64, tiers: &[CommissionTier], period_sales: f64) -> f64 {
    let sales = to_decimal(period_sales);
    let mut rate = flat_rate;
    for tier in tiers {
        if to_decimal(tier.sales_threshold) <= sales {
            rate = tier.commission_rate;
        }
    }
    rate
}

/// `round2(total * rate / 100)`
pub fn commission_amount(total_amount: f64, rate: f64) -> f64 {
    to_f64(to_decimal(total_amount) * to_decimal(rate) / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(level: i32, threshold: f64, rate: f64) -> CommissionTier {
        CommissionTier {
            id: format!("tier-{level}"),
            provider_id: "prov-1".to_string(),
            tier_level: level,
            sales_threshold: threshold,
            commission_rate: rate,
        }
    }

    fn canonical_tiers() -> Vec<CommissionTier> {
        vec![tier(1, 0.0, 30.0), tier(2, 500.0, 40.0), tier(3, 1000.0, 50.0)]
    }

    #[test]
    fn greatest_qualifying_threshold_wins() {
        let tiers = canonical_tiers();
        assert_eq!(rate_for(25.0, &tiers, 0.0), 30.0);
        assert_eq!(rate_for(25.0, &tiers, 499.99), 30.0);
        assert_eq!(rate_for(25.0, &tiers, 500.0), 40.0);
        assert_eq!(rate_for(25.0, &tiers, 999.99), 40.0);
        assert_eq!(rate_for(25.0, &tiers, 1000.0), 50.0);
        assert_eq!(rate_for(25.0, &tiers, 12_000.0), 50.0);
    }

    #[test]
    fn flat_rate_applies_below_the_lowest_tier() {
        let tiers = vec![tier(1, 300.0, 45.0)];
        assert_eq!(rate_for(25.0, &tiers, 299.99), 25.0);
        assert_eq!(rate_for(25.0, &tiers, 300.0), 45.0);
    }

    #[test]
    fn flat_rate_applies_without_tiers() {
        assert_eq!(rate_for(40.0, &[], 10_000.0), 40.0);
    }

    #[test]
    fn commission_rounds_half_up() {
        assert_eq!(commission_amount(80.0, 40.0), 32.0);
        // 33.335 rounds up, not to even
        assert_eq!(commission_amount(66.67, 50.0), 33.34);
        assert_eq!(commission_amount(0.01, 30.0), 0.0);
        assert_eq!(commission_amount(0.05, 30.0), 0.02);
    }

    #[test]
    fn money_eq_uses_a_cent_of_tolerance() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));
    }
}
