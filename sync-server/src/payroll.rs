//! Pay period calculator
//!
//! Maps any instant to its canonical pay-period window. Commission
//! resolution, reporting and hour tracking all go through `period_for`
//! so the three agree on "the current period" for any given instant.
//!
//! Periods are a fixed-length, non-overlapping, exhaustive partition of
//! the timeline. Length and anchor are configuration constants, not
//! calendar assumptions.

use serde::Serialize;

/// Pay period length in days
pub const PAY_PERIOD_DAYS: i64 = 14;

const MS_PER_DAY: i64 = 86_400_000;

/// Partition anchor: Monday 2024-01-01 00:00:00 UTC
pub const PAY_PERIOD_ANCHOR_MS: i64 = 1_704_067_200_000;

/// A pay-period window, half-open `[start_ms, end_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayPeriod {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl PayPeriod {
    pub fn contains(&self, ts_ms: i64) -> bool {
        ts_ms >= self.start_ms && ts_ms < self.end_ms
    }
}

/// The pay period containing the given instant (Unix millis)
pub fn period_for(ts_ms: i64) -> PayPeriod {
    let len = PAY_PERIOD_DAYS * MS_PER_DAY;
    let index = (ts_ms - PAY_PERIOD_ANCHOR_MS).div_euclid(len);
    let start_ms = PAY_PERIOD_ANCHOR_MS + index * len;
    PayPeriod {
        start_ms,
        end_ms: start_ms + len,
    }
}

/// The pay period containing the current instant
pub fn current_period() -> PayPeriod {
    period_for(chrono::Utc::now().timestamp_millis())
}
