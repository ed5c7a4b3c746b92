//! Audit log of routing decisions
//!
//! Every race and every decomposition appends one entry to a bounded ring.
//! Entries are appended by background continuations that outlive the request
//! they describe, so the ring sits behind a mutex and appends stay cheap.

pub mod advisor;

pub use advisor::{OptimizationReport, OptimizationSignal, SignalKind};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded routing decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuditEntry {
    /// A provider race
    Race(RaceAudit),
    /// A decomposition fan-out
    Decompose(DecomposeAudit),
}

/// Full record of one race, populated once every racer settled or the
/// ceiling fired
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceAudit {
    /// Race identifier, also returned to the caller
    pub race_id: String,
    /// When the race was dispatched
    pub started_at: DateTime<Utc>,
    /// Names of every raced provider
    pub providers: Vec<String>,
    /// The winning call, if any racer produced a non-blank response
    pub winner: Option<RaceOutcome>,
    /// Every settled call in settle order
    pub results: Vec<RaceOutcome>,
    /// Successful calls that lost the race, with latency deltas
    pub late_responses: Vec<RaceOutcome>,
    /// Failed calls
    pub errors: Vec<RaceOutcome>,
    /// Derived tuning signals
    pub signals: Vec<OptimizationSignal>,
    /// Time until the last racer settled
    pub total_latency_ms: u64,
}

/// How one provider's call in a race turned out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceOutcome {
    /// Provider name
    pub source: String,
    /// Provider service group
    pub engine: Option<String>,
    /// Ok or error
    pub status: CallStatus,
    /// Observed latency
    pub latency_ms: u64,
    /// Response length in bytes (zero for errors)
    pub response_length: usize,
    /// Model reported by the adapter
    pub model: Option<String>,
    /// True when the call succeeded after a winner was already declared
    pub late: bool,
    /// Latency delta from the winner, for late responses
    pub delta_ms: Option<u64>,
    /// Error description, for failed calls
    pub error: Option<String>,
}

/// Terminal status of one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// The call completed
    Ok,
    /// The call failed
    Error,
}

/// Record of one decomposition fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeAudit {
    /// Decomposition identifier, also returned to the caller
    pub decomp_id: String,
    /// When the fan-out was dispatched
    pub started_at: DateTime<Utc>,
    /// Leading snippet of the decomposed task
    pub task: String,
    /// Subtasks that completed
    pub subtasks: usize,
    /// Subtasks that failed
    pub failed: usize,
    /// Distinct providers that completed subtasks
    pub providers: Vec<String>,
    /// Wall time for the whole fan-out including merge
    pub total_latency_ms: u64,
}

/// Bounded ring of audit entries; oldest entries drop first
pub struct AuditLog {
    entries: Mutex<VecDeque<AuditEntry>>,
    capacity: usize,
}

impl AuditLog {
    /// A ring holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append an entry, dropping the oldest once at capacity
    pub fn append(&self, entry: AuditEntry) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The most recent `limit` entries, oldest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let entries = self.entries.lock();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Current entry count
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the ring is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
