//! Gateway and provider configuration
//!
//! All tunables live in explicit, serde-deserializable structs with the
//! defaulting rules applied through `#[serde(default)]`, so a partial YAML
//! document (or `..Default::default()` in code) always yields a fully
//! specified configuration.

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Observational budget caps in USD
    pub budget: BudgetConfig,
    /// Exact-match response cache tunables
    pub cache: CacheConfig,
    /// Minimum similarity score for a semantic cache hit
    pub semantic_threshold: f64,
    /// Maximum entries kept in the audit ring
    pub audit_max_entries: usize,
    /// Hard ceiling on a race before it resolves as failed, in milliseconds
    pub race_ceiling_ms: u64,
    /// Optional per-provider call timeout in milliseconds.
    ///
    /// Off by default: timeout discipline is otherwise left to provider
    /// adapters, and the race ceiling is the only bound the gateway enforces.
    pub provider_call_timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            cache: CacheConfig::default(),
            semantic_threshold: 0.85,
            audit_max_entries: 500,
            race_ceiling_ms: 30_000,
            provider_call_timeout_ms: None,
        }
    }
}

impl GatewayConfig {
    /// Parse a configuration from a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Race ceiling as a [`Duration`]
    pub fn race_ceiling(&self) -> Duration {
        Duration::from_millis(self.race_ceiling_ms)
    }

    /// Per-provider call timeout as a [`Duration`], when configured
    pub fn provider_call_timeout(&self) -> Option<Duration> {
        self.provider_call_timeout_ms.map(Duration::from_millis)
    }
}

/// Daily and monthly spend caps, in USD. Observational only: crossing a cap
/// never blocks a request, it just feeds the optimization advisor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Daily cap
    pub daily: f64,
    /// Monthly cap
    pub monthly: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily: 10.0,
            monthly: 100.0,
        }
    }
}

/// Exact-match cache tunables
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of entries before FIFO eviction kicks in
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_entries: 200,
        }
    }
}

impl CacheConfig {
    /// TTL as a [`Duration`]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// What a provider can do. Used by the availability filter to match
/// capability-specific requests (embedding today, vision and the rest as
/// adapters grow into them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Chat completion
    Chat,
    /// Text embedding
    Embed,
    /// Code generation
    Code,
    /// Image understanding
    Vision,
    /// Extended reasoning
    Thinking,
}

/// Static configuration for one registered provider.
///
/// Immutable after registration; runtime state (health, rate windows) lives
/// in the registry, keyed by `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name, e.g. `"claude"` or `"gemini"`. Registering the
    /// same name twice replaces the earlier registration.
    pub name: String,
    /// Human-readable service-group label reported as the `engine` of a
    /// response. Defaults to `"<name>-pool"`.
    #[serde(default)]
    pub service_group: Option<String>,
    /// Dispatch priority; lower dispatches first, ties break by registration
    /// order.
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Advertised capabilities
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<Capability>,
    /// Rate limits
    #[serde(default)]
    pub limits: ProviderLimits,
    /// Pricing per million tokens
    #[serde(default)]
    pub pricing: ProviderPricing,
    /// Disabled providers stay registered but are never dispatched
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ProviderConfig {
    /// A provider config with the given name and all defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_group: None,
            priority: default_priority(),
            capabilities: default_capabilities(),
            limits: ProviderLimits::default(),
            pricing: ProviderPricing::default(),
            enabled: true,
        }
    }

    /// Set the service-group label (builder pattern)
    pub fn with_service_group(mut self, group: impl Into<String>) -> Self {
        self.service_group = Some(group.into());
        self
    }

    /// Set the dispatch priority (builder pattern)
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the capability list (builder pattern)
    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set rate limits (builder pattern)
    pub fn with_limits(mut self, limits: ProviderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set pricing (builder pattern)
    pub fn with_pricing(mut self, pricing: ProviderPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Enable or disable dispatch (builder pattern)
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The effective service-group label
    pub fn service_group(&self) -> String {
        self.service_group
            .clone()
            .unwrap_or_else(|| format!("{}-pool", self.name))
    }

    /// Whether the provider advertises a capability
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Per-provider rate limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderLimits {
    /// Requests per minute
    pub rpm: u32,
    /// Tokens per minute
    pub tpm: u32,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            rpm: 60,
            tpm: 100_000,
        }
    }
}

/// Per-provider pricing in USD per million tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderPricing {
    /// Input token price per 1M
    pub input_per_1m: f64,
    /// Output token price per 1M
    pub output_per_1m: f64,
}

impl Default for ProviderPricing {
    fn default() -> Self {
        Self {
            input_per_1m: 1.0,
            output_per_1m: 3.0,
        }
    }
}

fn default_priority() -> u32 {
    50
}

fn default_capabilities() -> Vec<Capability> {
    vec![Capability::Chat]
}

fn default_enabled() -> bool {
    true
}
