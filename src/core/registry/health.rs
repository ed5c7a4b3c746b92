//! Per-provider health records
//!
//! One record per registered provider, mutated on every call completion —
//! including completions that settle long after a race already returned to
//! the caller.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Consecutive failures that open the circuit breaker
pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;

/// How long an open circuit keeps the provider out of availability,
/// measured from the last recorded failure
pub const CIRCUIT_COOLDOWN: Duration = Duration::from_millis(60_000);

/// Mutable health state for one provider
#[derive(Debug, Clone)]
pub struct HealthRecord {
    /// False once the failure threshold is crossed
    pub healthy: bool,
    /// Consecutive failures since the last success
    pub consecutive_failures: u32,
    /// Timestamp of the most recent success or failure
    pub last_check: Instant,
    /// Exponential moving average latency (alpha = 0.2), in milliseconds
    pub avg_latency_ms: f64,
    /// Lifetime completed calls
    pub total_calls: u64,
    /// Lifetime failed calls
    pub total_errors: u64,
}

impl HealthRecord {
    /// A fresh record for a just-registered provider
    pub fn new() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_check: Instant::now(),
            avg_latency_ms: 0.0,
            total_calls: 0,
            total_errors: 0,
        }
    }

    /// Record a successful call. Resets the failure streak and folds the
    /// observed latency into the moving average.
    pub fn record_success(&mut self, latency_ms: u64) {
        self.healthy = true;
        self.consecutive_failures = 0;
        self.last_check = Instant::now();
        self.total_calls += 1;
        self.avg_latency_ms = (self.avg_latency_ms * 0.8 + latency_ms as f64 * 0.2).round();
    }

    /// Record a failed call, flipping `healthy` once the threshold is crossed
    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        self.total_errors += 1;
        self.last_check = Instant::now();
        if self.consecutive_failures >= CIRCUIT_FAILURE_THRESHOLD {
            self.healthy = false;
        }
    }

    /// Whether the circuit breaker currently excludes this provider.
    ///
    /// Open while the failure streak has reached the threshold and the
    /// cooldown since the last check has not yet elapsed; after the cooldown
    /// the provider gets probed again even though the streak still stands.
    pub fn circuit_open(&self) -> bool {
        self.consecutive_failures >= CIRCUIT_FAILURE_THRESHOLD
            && self.last_check.elapsed() < CIRCUIT_COOLDOWN
    }

    /// Serializable snapshot for stats reporting
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self.healthy,
            consecutive_failures: self.consecutive_failures,
            avg_latency_ms: self.avg_latency_ms,
            total_calls: self.total_calls,
            total_errors: self.total_errors,
        }
    }
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a [`HealthRecord`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Current healthy flag
    pub healthy: bool,
    /// Consecutive failures since the last success
    pub consecutive_failures: u32,
    /// EMA latency in milliseconds
    pub avg_latency_ms: f64,
    /// Lifetime completed calls
    pub total_calls: u64,
    /// Lifetime failed calls
    pub total_errors: u64,
}
