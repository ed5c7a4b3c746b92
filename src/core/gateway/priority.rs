//! Request priority classification
//!
//! When the caller does not pin a priority, the message text decides it.
//! Keyword checks run on the lowercased message; length thresholds are in
//! bytes. Classification only steers cache eligibility today, but the
//! priority travels with the response so front doors can surface it.

use serde::{Deserialize, Serialize};

const CRITICAL_KEYWORDS: [&str; 4] = ["architecture", "security audit", "refactor", "deploy"];
const HIGH_KEYWORDS: [&str; 5] = ["analyze", "debug", "optimize", "implement", "review"];
const LOW_KEYWORDS: [&str; 4] = ["hello", "status", "what is", "who are"];

/// Request priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Short or conversational traffic
    Low,
    /// The default middle ground
    Medium,
    /// Substantial analytical work
    High,
    /// Long or high-stakes requests; never served from or written to the
    /// exact cache
    Critical,
}

impl Priority {
    /// Classify a message that arrived without an explicit priority
    pub fn classify(message: &str) -> Self {
        let m = message.to_lowercase();
        let len = m.len();

        if len > 800 || CRITICAL_KEYWORDS.iter().any(|k| m.contains(k)) {
            return Priority::Critical;
        }
        if len > 300 || HIGH_KEYWORDS.iter().any(|k| m.contains(k)) {
            return Priority::High;
        }
        if len < 50 || LOW_KEYWORDS.iter().any(|k| m.contains(k)) {
            return Priority::Low;
        }
        Priority::Medium
    }

    /// Whether this priority goes through the cache probe
    pub fn cache_eligible(self) -> bool {
        matches!(self, Priority::Low | Priority::Medium)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        f.write_str(s)
    }
}
