//! The routing gateway
//!
//! One `Gateway` instance owns every piece of routing state for a process:
//! the provider registry, both cache tiers, the cost ledger, and the audit
//! ring. Construct it explicitly, register providers, and drop it to tear
//! everything down — there are no ambient globals.
//!
//! ## Module structure
//!
//! - `priority` - request priority classification
//! - `race` - concurrent dispatch, first non-blank response wins
//! - `sequential` - priority-ordered fallback dispatch
//! - `types` - request options, replies, stats

pub mod priority;
pub mod race;
pub mod sequential;
pub mod types;

pub use priority::Priority;
pub use types::{
    ChatOptions, ChatReply, EmbedReply, GatewayStats, ProviderStatus, RaceTag, SemanticProvenance,
};

use crate::config::{GatewayConfig, ProviderConfig};
use crate::core::audit::{AuditEntry, AuditLog, advisor};
use crate::core::cache::{ExactCache, SemanticCache, SemanticMemory};
use crate::core::cost::{CostLedger, estimate_cost};
use crate::core::providers::{CallOptions, ChatCompletion, ChatProvider, ProviderError};
use crate::core::registry::{ProviderRegistry, RegisteredProvider};
use crate::utils::error::{GatewayError, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering::Relaxed;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use types::RequestCounters;
use uuid::Uuid;

/// Routing gateway over interchangeable LLM providers
pub struct Gateway {
    pub(crate) config: GatewayConfig,
    pub(crate) registry: Arc<ProviderRegistry>,
    pub(crate) cache: Arc<ExactCache>,
    pub(crate) semantic: Option<Arc<SemanticCache>>,
    pub(crate) ledger: Arc<CostLedger>,
    pub(crate) audit: Arc<AuditLog>,
    pub(crate) counters: Arc<RequestCounters>,
    pub(crate) wins: Arc<DashMap<String, u64>>,
}

impl Gateway {
    /// A gateway with no providers and no semantic memory
    pub fn new(config: GatewayConfig) -> Self {
        let cache = ExactCache::new(config.cache.max_entries, config.cache.ttl());
        let ledger = CostLedger::new(config.budget);
        let audit = AuditLog::new(config.audit_max_entries);
        Self {
            registry: Arc::new(ProviderRegistry::new()),
            cache: Arc::new(cache),
            semantic: None,
            ledger: Arc::new(ledger),
            audit: Arc::new(audit),
            counters: Arc::new(RequestCounters::default()),
            wins: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Attach the optional semantic-memory collaborator (builder pattern)
    pub fn with_semantic_memory(mut self, memory: Arc<dyn SemanticMemory>) -> Self {
        self.semantic = Some(Arc::new(SemanticCache::new(
            memory,
            self.config.semantic_threshold,
        )));
        self
    }

    /// Register a provider adapter under its configuration
    pub fn register_provider(&self, config: ProviderConfig, adapter: Arc<dyn ChatProvider>) {
        self.registry.register(config, adapter);
    }

    /// Send a chat request through the gateway.
    ///
    /// Routing order: cache probe (low/medium priority), availability filter,
    /// then a race across every eligible provider — or strict priority-order
    /// sequential dispatch when forced or when only one candidate remains.
    pub async fn chat(&self, message: &str, opts: ChatOptions) -> Result<ChatReply> {
        self.counters.total_requests.fetch_add(1, Relaxed);
        let race_id = format!("gw-{}", Uuid::new_v4().simple());
        let priority = opts
            .priority
            .unwrap_or_else(|| Priority::classify(message));
        let started = Instant::now();

        self.ledger.roll_resets();

        let cache_allowed = opts.cache.unwrap_or(true);
        if cache_allowed && priority.cache_eligible() {
            let key = ExactCache::key(opts.system.as_deref(), message);
            if let Some(hit) = self.cache.get(&key) {
                self.counters.cache_hits.fetch_add(1, Relaxed);
                debug!(race_id = %race_id, engine = %hit.engine, "exact cache hit");
                return Ok(ChatReply {
                    response: hit.response,
                    engine: hit.engine,
                    model: None,
                    cached: true,
                    semantic: None,
                    latency_ms: 0,
                    race: RaceTag {
                        id: race_id,
                        priority,
                    },
                });
            }
            if let Some(semantic) = &self.semantic {
                if let Some(hit) = semantic.lookup(message).await {
                    self.counters.semantic_cache_hits.fetch_add(1, Relaxed);
                    debug!(race_id = %race_id, similarity = hit.similarity, "semantic cache hit");
                    return Ok(ChatReply {
                        response: hit.response,
                        engine: "semantic-cache".to_string(),
                        model: None,
                        cached: true,
                        semantic: Some(SemanticProvenance {
                            similarity: hit.similarity,
                            source_question: hit.source_question,
                            proven_by: hit.proven_by,
                        }),
                        latency_ms: started.elapsed().as_millis() as u64,
                        race: RaceTag {
                            id: race_id,
                            priority,
                        },
                    });
                }
            }
        }

        let available = self.registry.available();
        if available.is_empty() {
            return Err(GatewayError::NoProvidersAvailable);
        }

        let call_opts = CallOptions {
            temperature: opts.temperature,
            max_tokens: opts.max_tokens,
        };
        let routed = if !opts.sequential && available.len() > 1 {
            self.race_providers(&available, message, opts.system.as_deref(), &call_opts, &race_id)
                .await?
        } else {
            self.route_sequential(&available, message, opts.system.as_deref(), &call_opts)
                .await?
        };

        let cost = estimate_cost(&routed.provider.config.pricing, message, &routed.response);
        self.ledger.record(cost);

        if priority != Priority::Critical {
            let key = ExactCache::key(opts.system.as_deref(), message);
            self.cache
                .put(key, routed.response.clone(), routed.engine.clone());
        }
        if let Some(semantic) = &self.semantic {
            semantic.store_proven(
                message,
                &routed.response,
                &routed.engine,
                routed.model.as_deref(),
                self.registry.enabled_count(),
            );
        }
        self.record_win(routed.provider.name());

        info!(
            race_id = %race_id,
            engine = %routed.engine,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat routed"
        );
        Ok(ChatReply {
            response: routed.response,
            engine: routed.engine,
            model: routed.model,
            cached: false,
            semantic: None,
            latency_ms: started.elapsed().as_millis() as u64,
            race: RaceTag {
                id: race_id,
                priority,
            },
        })
    }

    /// Embed text through the first embed-capable provider that answers.
    ///
    /// Sequential trial only; embedding never races.
    pub async fn embed(&self, text: &str, opts: CallOptions) -> Result<EmbedReply> {
        let candidates = self.registry.embed_capable();
        for provider in candidates {
            let start = Instant::now();
            match provider.adapter.embed(text, &opts).await {
                Ok(embedding) => {
                    self.registry
                        .record_success(provider.name(), start.elapsed().as_millis() as u64);
                    return Ok(EmbedReply {
                        embedding: embedding.embedding,
                        dimensions: embedding.dimensions,
                        engine: provider.service_group.clone(),
                    });
                }
                Err(err) => {
                    debug!(provider = %provider.name(), error = %err, "embed attempt failed");
                    self.registry.record_failure(provider.name());
                }
            }
        }
        Err(GatewayError::NoEmbeddingProviderAvailable)
    }

    /// Read-only gateway statistics
    pub fn stats(&self) -> GatewayStats {
        let providers = self
            .registry
            .all()
            .iter()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                service_group: p.service_group.clone(),
                enabled: p.config.enabled,
                priority: p.config.priority,
                capabilities: p.config.capabilities.clone(),
                health: self.registry.health_snapshot(p.name()),
                rate: self.registry.rate_snapshot(p.name()),
            })
            .collect();
        let wins: HashMap<String, u64> = self
            .wins
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();

        GatewayStats {
            total_requests: self.counters.total_requests.load(Relaxed),
            cache_hits: self.counters.cache_hits.load(Relaxed),
            semantic_cache_hits: self.counters.semantic_cache_hits.load(Relaxed),
            failures: self.registry.total_failures(),
            wins,
            providers,
            budget: self.ledger.snapshot(),
            cache_entries: self.cache.len(),
            audit_entries: self.audit.len(),
        }
    }

    /// The most recent `limit` audit entries, oldest first
    pub fn audit(&self, limit: usize) -> Vec<AuditEntry> {
        self.audit.recent(limit)
    }

    /// Derive tuning recommendations from the audit ring and budget state
    pub fn optimizations(&self) -> advisor::OptimizationReport {
        let entries = self.audit.recent(self.config.audit_max_entries);
        let names: Vec<String> = self
            .registry
            .all()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        advisor::derive(&entries, &names, &self.ledger.snapshot())
    }

    pub(crate) fn record_win(&self, name: &str) {
        self.wins
            .entry(name.to_string())
            .and_modify(|w| *w += 1)
            .or_insert(1);
    }
}

/// Call a provider's chat, applying the gateway's optional per-call timeout
pub(crate) async fn guarded_chat(
    provider: &Arc<RegisteredProvider>,
    message: &str,
    system: Option<&str>,
    opts: &CallOptions,
    timeout: Option<Duration>,
) -> std::result::Result<ChatCompletion, ProviderError> {
    let call = provider.adapter.chat(message, system, opts);
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        },
        None => call.await,
    }
}
