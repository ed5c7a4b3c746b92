//! Optimization advisor
//!
//! Derives tuning recommendations from the audit ring and the budget ledger
//! on demand. Purely read-only; nothing here feeds back into routing.

use super::{AuditEntry, RaceAudit};
use crate::core::cost::BudgetSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Winning-latency average above which a provider draws a signal
const SLOW_WINNER_MS: f64 = 10_000.0;
/// Logged races needed before never-winning providers draw a signal
const NEVER_WINS_MIN_RACES: usize = 10;
/// Fraction of the daily cap that triggers the budget warning
const BUDGET_WARN_FRACTION: f64 = 0.8;

/// A single tuning recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSignal {
    /// What kind of signal this is
    pub kind: SignalKind,
    /// The provider concerned, when provider-specific
    pub provider: Option<String>,
    /// Human-readable recommendation
    pub recommendation: String,
}

/// Signal discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    /// A losing racer produced a substantially longer response than the winner
    LateButRicher,
    /// A provider has never won despite many logged races
    NeverWins,
    /// A provider's average winning latency is very high
    HighLatency,
    /// Daily spend is approaching its cap
    BudgetWarning,
}

/// Advisor output: signals plus the aggregates they were derived from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Derived recommendations
    pub signals: Vec<OptimizationSignal>,
    /// Race wins per provider
    pub win_counts: HashMap<String, u64>,
    /// Average winning latency per provider, in milliseconds
    pub avg_winner_latency_ms: HashMap<String, u64>,
}

/// Derive a report from audit entries, the registered provider names, and
/// the current budget state
pub fn derive(
    entries: &[AuditEntry],
    provider_names: &[String],
    budget: &BudgetSnapshot,
) -> OptimizationReport {
    let races: Vec<&RaceAudit> = entries
        .iter()
        .filter_map(|e| match e {
            AuditEntry::Race(race) => Some(race),
            AuditEntry::Decompose(_) => None,
        })
        .collect();

    let mut win_counts: HashMap<String, u64> = HashMap::new();
    let mut winner_latencies: HashMap<String, Vec<u64>> = HashMap::new();
    for race in &races {
        if let Some(winner) = &race.winner {
            *win_counts.entry(winner.source.clone()).or_insert(0) += 1;
            winner_latencies
                .entry(winner.source.clone())
                .or_default()
                .push(winner.latency_ms);
        }
    }

    let mut signals = Vec::new();

    if races.len() >= NEVER_WINS_MIN_RACES {
        for name in provider_names {
            if !win_counts.contains_key(name) {
                signals.push(OptimizationSignal {
                    kind: SignalKind::NeverWins,
                    provider: Some(name.clone()),
                    recommendation: format!(
                        "{name} has never won a race. Consider lowering its priority or disabling it to save budget."
                    ),
                });
            }
        }
    }

    let mut avg_winner_latency_ms = HashMap::new();
    for (name, latencies) in &winner_latencies {
        let avg = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
        avg_winner_latency_ms.insert(name.clone(), avg.round() as u64);
        if avg > SLOW_WINNER_MS {
            signals.push(OptimizationSignal {
                kind: SignalKind::HighLatency,
                provider: Some(name.clone()),
                recommendation: format!(
                    "{name} wins averaging {}ms. Consider a timeout or priority adjustment.",
                    avg.round() as u64
                ),
            });
        }
    }

    if budget.daily_spent > budget.daily_cap * BUDGET_WARN_FRACTION {
        let used = (budget.daily_spent / budget.daily_cap * 100.0).round() as u64;
        signals.push(OptimizationSignal {
            kind: SignalKind::BudgetWarning,
            provider: None,
            recommendation: format!(
                "{used}% of the daily budget is used. Reduce request volume or shift to cheaper providers."
            ),
        });
    }

    OptimizationReport {
        signals,
        win_counts,
        avg_winner_latency_ms,
    }
}
