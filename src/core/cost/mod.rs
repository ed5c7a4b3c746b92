//! Cost estimation and the observational budget ledger
//!
//! Spend tracking is visibility only. Crossing a cap never blocks a request;
//! it just shows up in stats and as an advisor signal. Token counts are
//! estimated at four characters per token since adapters for some vendors
//! never report usage.

use crate::config::{BudgetConfig, ProviderPricing};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Estimate the cost of one completed call in USD.
///
/// `ceil(chars / 4)` approximates the token count on both sides.
pub fn estimate_cost(pricing: &ProviderPricing, input: &str, output: &str) -> f64 {
    let input_tokens = (input.len() as f64 / 4.0).ceil();
    let output_tokens = (output.len() as f64 / 4.0).ceil();
    input_tokens / 1e6 * pricing.input_per_1m + output_tokens / 1e6 * pricing.output_per_1m
}

/// Running daily/monthly spend with calendar reset boundaries
pub struct CostLedger {
    caps: BudgetConfig,
    state: Mutex<BudgetState>,
}

#[derive(Debug, Clone)]
struct BudgetState {
    daily_spent: f64,
    monthly_spent: f64,
    daily_reset_at: DateTime<Local>,
    monthly_reset_at: DateTime<Local>,
}

impl CostLedger {
    /// A ledger starting at zero spend, with resets at the next local
    /// midnight and the next first-of-month
    pub fn new(caps: BudgetConfig) -> Self {
        let now = Local::now();
        Self {
            caps,
            state: Mutex::new(BudgetState {
                daily_spent: 0.0,
                monthly_spent: 0.0,
                daily_reset_at: next_daily_reset(now),
                monthly_reset_at: next_monthly_reset(now),
            }),
        }
    }

    /// Zero out any accumulator whose reset boundary has passed
    pub fn roll_resets(&self) {
        self.roll_resets_at(Local::now());
    }

    pub(crate) fn roll_resets_at(&self, now: DateTime<Local>) {
        let mut state = self.state.lock();
        if now >= state.daily_reset_at {
            state.daily_spent = 0.0;
            state.daily_reset_at = next_daily_reset(now);
        }
        if now >= state.monthly_reset_at {
            state.monthly_spent = 0.0;
            state.monthly_reset_at = next_monthly_reset(now);
        }
    }

    /// Add a successful call's cost to both accumulators
    pub fn record(&self, cost: f64) {
        self.record_at(cost, Local::now());
    }

    pub(crate) fn record_at(&self, cost: f64, now: DateTime<Local>) {
        self.roll_resets_at(now);
        let mut state = self.state.lock();
        state.daily_spent += cost;
        state.monthly_spent += cost;
    }

    /// Current spend and boundaries
    pub fn snapshot(&self) -> BudgetSnapshot {
        let state = self.state.lock();
        BudgetSnapshot {
            daily_spent: state.daily_spent,
            monthly_spent: state.monthly_spent,
            daily_cap: self.caps.daily,
            monthly_cap: self.caps.monthly,
            daily_reset_at: state.daily_reset_at,
            monthly_reset_at: state.monthly_reset_at,
        }
    }

    #[cfg(test)]
    pub(crate) fn force_boundaries(
        &self,
        daily_reset_at: DateTime<Local>,
        monthly_reset_at: DateTime<Local>,
    ) {
        let mut state = self.state.lock();
        state.daily_reset_at = daily_reset_at;
        state.monthly_reset_at = monthly_reset_at;
    }
}

/// Point-in-time view of the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Spend since the last daily reset
    pub daily_spent: f64,
    /// Spend since the last monthly reset
    pub monthly_spent: f64,
    /// Configured daily cap
    pub daily_cap: f64,
    /// Configured monthly cap
    pub monthly_cap: f64,
    /// Next daily reset boundary
    pub daily_reset_at: DateTime<Local>,
    /// Next monthly reset boundary
    pub monthly_reset_at: DateTime<Local>,
}

/// Midnight at the start of tomorrow, local time
fn next_daily_reset(now: DateTime<Local>) -> DateTime<Local> {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .unwrap_or_else(|| now.date_naive());
    local_midnight(tomorrow).unwrap_or_else(|| now + chrono::Duration::days(1))
}

/// Midnight on the 1st of next month, local time
fn next_monthly_reset(now: DateTime<Local>) -> DateTime<Local> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(local_midnight)
        .unwrap_or_else(|| now + chrono::Duration::days(31))
}

/// Local midnight can be ambiguous or missing around DST shifts; take the
/// earliest valid instant of the day
fn local_midnight(date: NaiveDate) -> Option<DateTime<Local>> {
    date.and_hms_opt(0, 0, 0)?.and_local_timezone(Local).earliest()
}
