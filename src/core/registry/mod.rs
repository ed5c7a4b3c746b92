//! Provider registry and availability filter
//!
//! Holds the ordered provider set plus the runtime state the routing engine
//! consults on every request: health records (circuit breaking) and rate
//! windows (per-minute quotas). Health and rate maps are `DashMap`s so the
//! background continuations of a race can update them concurrently with new
//! requests.

pub mod health;
pub mod rate;

pub use health::{CIRCUIT_COOLDOWN, CIRCUIT_FAILURE_THRESHOLD, HealthRecord, HealthSnapshot};
pub use rate::{RATE_WINDOW, RateSnapshot, RateWindow};

use crate::config::{Capability, ProviderConfig};
use crate::core::providers::ChatProvider;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// A provider plus the adapter that talks to it
pub struct RegisteredProvider {
    /// Static configuration, immutable after registration
    pub config: ProviderConfig,
    /// Resolved service-group label
    pub service_group: String,
    /// The adapter performing actual calls
    pub adapter: Arc<dyn ChatProvider>,
}

impl RegisteredProvider {
    /// Provider name shorthand
    pub fn name(&self) -> &str {
        &self.config.name
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.config.name)
            .field("priority", &self.config.priority)
            .field("enabled", &self.config.enabled)
            .finish()
    }
}

/// Ordered provider set with per-provider runtime state
#[derive(Default)]
pub struct ProviderRegistry {
    /// Providers sorted ascending by priority; ties keep registration order
    providers: RwLock<Vec<Arc<RegisteredProvider>>>,
    /// Health record per provider name
    health: DashMap<String, HealthRecord>,
    /// Rate window per provider name
    rate: DashMap<String, RateWindow>,
}

impl ProviderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A later registration under the same name replaces
    /// the earlier one outright; the sort is stable, so equal priorities keep
    /// their registration order.
    pub fn register(&self, config: ProviderConfig, adapter: Arc<dyn ChatProvider>) {
        let name = config.name.clone();
        let service_group = config.service_group();
        let registered = Arc::new(RegisteredProvider {
            config,
            service_group,
            adapter,
        });

        let mut providers = self.providers.write();
        providers.retain(|p| p.config.name != name);
        providers.push(registered);
        providers.sort_by_key(|p| p.config.priority);

        self.health.insert(name.clone(), HealthRecord::new());
        self.rate.insert(name.clone(), RateWindow::new());
        info!(provider = %name, "registered provider");
    }

    /// All registered providers in priority order
    pub fn all(&self) -> Vec<Arc<RegisteredProvider>> {
        self.providers.read().clone()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// Number of enabled providers
    pub fn enabled_count(&self) -> usize {
        self.providers
            .read()
            .iter()
            .filter(|p| p.config.enabled)
            .count()
    }

    /// The availability filter: enabled, circuit closed (or cooled down),
    /// and rate-window capacity remaining — in priority order.
    pub fn available(&self) -> Vec<Arc<RegisteredProvider>> {
        let providers = self.providers.read();
        providers
            .iter()
            .filter(|p| {
                if !p.config.enabled {
                    return false;
                }
                if let Some(h) = self.health.get(p.name()) {
                    if h.circuit_open() {
                        debug!(provider = %p.name(), "skipping circuit-broken provider");
                        return false;
                    }
                }
                if let Some(mut w) = self.rate.get_mut(p.name()) {
                    if !w.has_capacity(p.config.limits.rpm) {
                        debug!(provider = %p.name(), "skipping rate-limited provider");
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    /// Enabled providers advertising the embed capability, in priority order
    pub fn embed_capable(&self) -> Vec<Arc<RegisteredProvider>> {
        self.providers
            .read()
            .iter()
            .filter(|p| p.config.enabled && p.config.has_capability(Capability::Embed))
            .cloned()
            .collect()
    }

    /// Consume one rate unit for a dispatched call
    pub fn consume_rate(&self, name: &str) {
        if let Some(mut w) = self.rate.get_mut(name) {
            w.consume();
        }
    }

    /// Record a successful call completion
    pub fn record_success(&self, name: &str, latency_ms: u64) {
        if let Some(mut h) = self.health.get_mut(name) {
            h.record_success(latency_ms);
        }
    }

    /// Record a failed call completion
    pub fn record_failure(&self, name: &str) {
        if let Some(mut h) = self.health.get_mut(name) {
            h.record_failure();
            if !h.healthy {
                debug!(provider = %name, failures = h.consecutive_failures, "provider circuit opened");
            }
        }
    }

    /// Health snapshot for one provider
    pub fn health_snapshot(&self, name: &str) -> Option<HealthSnapshot> {
        self.health.get(name).map(|h| h.snapshot())
    }

    /// Rate snapshot for one provider
    pub fn rate_snapshot(&self, name: &str) -> Option<RateSnapshot> {
        let rpm = self
            .providers
            .read()
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.config.limits.rpm)?;
        self.rate.get(name).map(|w| w.snapshot(rpm))
    }

    /// Lifetime failure count summed over all providers
    pub fn total_failures(&self) -> u64 {
        self.health.iter().map(|h| h.total_errors).sum()
    }
}
