//! Per-provider rate windows
//!
//! A fixed 60-second window per provider. Capacity checks and consumption
//! both roll the window first, so a provider that saturated its quota comes
//! back automatically once the window elapses.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Window length
pub const RATE_WINDOW: Duration = Duration::from_millis(60_000);

/// Request quota consumption for one provider's current window
#[derive(Debug, Clone)]
pub struct RateWindow {
    /// When the current window opened
    pub window_start: Instant,
    /// Requests dispatched in the current window
    pub used: u32,
}

impl RateWindow {
    /// A fresh, empty window
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            used: 0,
        }
    }

    /// Reset the window if it has elapsed
    fn roll(&mut self) {
        if self.window_start.elapsed() > RATE_WINDOW {
            self.used = 0;
            self.window_start = Instant::now();
        }
    }

    /// Whether another dispatch fits under the given requests-per-minute limit
    pub fn has_capacity(&mut self, rpm: u32) -> bool {
        self.roll();
        self.used < rpm
    }

    /// Consume one dispatch unit. Called for every dispatched call,
    /// regardless of how the call turns out.
    pub fn consume(&mut self) {
        self.roll();
        self.used += 1;
    }

    /// Serializable snapshot for stats reporting
    pub fn snapshot(&self, rpm: u32) -> RateSnapshot {
        RateSnapshot {
            rpm,
            used: self.used,
            window_age_ms: self.window_start.elapsed().as_millis() as u64,
        }
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a [`RateWindow`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Configured requests-per-minute limit
    pub rpm: u32,
    /// Requests consumed in the current window
    pub used: u32,
    /// Age of the current window in milliseconds
    pub window_age_ms: u64,
}
