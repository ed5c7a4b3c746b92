//! Gateway request/response types

use crate::config::Capability;
use crate::core::cost::BudgetSnapshot;
use crate::core::registry::{HealthSnapshot, RateSnapshot, RegisteredProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use super::priority::Priority;

/// Options for a `chat` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatOptions {
    /// System prompt forwarded to providers
    pub system: Option<String>,
    /// Explicit priority; classified from the message when absent
    pub priority: Option<Priority>,
    /// Explicitly disable (or force-enable) the cache probe
    pub cache: Option<bool>,
    /// Force sequential routing instead of racing
    pub sequential: bool,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Response token budget
    pub max_tokens: Option<u32>,
}

/// Identifies the dispatch a response came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTag {
    /// Race identifier (also the audit key)
    pub id: String,
    /// Effective request priority
    pub priority: Priority,
}

/// Provenance attached to semantic-cache hits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticProvenance {
    /// Similarity score of the matched entry
    pub similarity: f64,
    /// The question the cached answer originally addressed
    pub source_question: String,
    /// Service group that proved the answer
    pub proven_by: String,
}

/// A successful `chat` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Response text
    pub response: String,
    /// Service group that produced the response (or `semantic-cache`)
    pub engine: String,
    /// Concrete model, when the adapter reported one
    pub model: Option<String>,
    /// True when served from either cache tier
    pub cached: bool,
    /// Present only on semantic-cache hits
    pub semantic: Option<SemanticProvenance>,
    /// End-to-end latency observed by the gateway
    pub latency_ms: u64,
    /// Dispatch identity
    pub race: RaceTag,
}

/// A successful `embed` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedReply {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Vector dimensionality
    pub dimensions: usize,
    /// Service group that produced the embedding
    pub engine: String,
}

/// Read-only gateway statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayStats {
    /// Chat and decompose requests accepted
    pub total_requests: u64,
    /// Exact-cache hits
    pub cache_hits: u64,
    /// Semantic-cache hits
    pub semantic_cache_hits: u64,
    /// Lifetime provider call failures
    pub failures: u64,
    /// Wins per provider (races and sequential successes)
    pub wins: HashMap<String, u64>,
    /// Per-provider status
    pub providers: Vec<ProviderStatus>,
    /// Budget ledger snapshot
    pub budget: BudgetSnapshot,
    /// Live exact-cache entries
    pub cache_entries: usize,
    /// Audit ring entries
    pub audit_entries: usize,
}

/// Per-provider block inside [`GatewayStats`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatus {
    /// Provider name
    pub name: String,
    /// Service group label
    pub service_group: String,
    /// Enabled flag
    pub enabled: bool,
    /// Dispatch priority
    pub priority: u32,
    /// Advertised capabilities
    pub capabilities: Vec<Capability>,
    /// Health record snapshot
    pub health: Option<HealthSnapshot>,
    /// Rate window snapshot
    pub rate: Option<RateSnapshot>,
}

/// Atomic request counters shared with background continuations
#[derive(Debug, Default)]
pub(crate) struct RequestCounters {
    pub total_requests: AtomicU64,
    pub cache_hits: AtomicU64,
    pub semantic_cache_hits: AtomicU64,
}

/// A routed call that produced a response, before post-success bookkeeping
pub(crate) struct RouteSuccess {
    pub response: String,
    pub engine: String,
    pub model: Option<String>,
    pub provider: Arc<RegisteredProvider>,
}
