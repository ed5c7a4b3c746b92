//! Task decomposition (fan-out / fan-in)
//!
//! Splits one complex task into independent subtasks, spreads them
//! round-robin across every available provider, executes them concurrently,
//! and merges the results. The split itself is LLM-driven with a
//! deterministic fallback chain, so decomposition never dies on a
//! malformed decomposer response.
//!
//! ## Module structure
//!
//! - `split` - subtask JSON parsing and the fallback split chain
//! - `merge` - concat / best / synthesize merge strategies

pub mod merge;
pub mod split;

use crate::config::ProviderPricing;
use crate::core::audit::{AuditEntry, DecomposeAudit};
use crate::core::cost::estimate_cost;
use crate::core::gateway::{Gateway, guarded_chat};
use crate::core::providers::CallOptions;
use crate::core::registry::{ProviderRegistry, RegisteredProvider};
use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::Ordering::Relaxed;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Upper bound on subtasks when the caller does not override it
const DEFAULT_MAX_SUBTASKS: usize = 9;

/// Options for a `decompose` call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecomposeOptions {
    /// System prompt folded into every subtask
    pub system: Option<String>,
    /// Cap on generated subtasks; always clamped to the available provider
    /// count
    pub max_subtasks: Option<usize>,
    /// How to merge subtask outputs
    pub merge_strategy: Option<MergeStrategy>,
    /// Sampling temperature for subtask calls
    pub temperature: Option<f32>,
    /// Token budget for subtask calls
    pub max_tokens: Option<u32>,
}

/// How subtask outputs become one response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Join every subtask's heading and body in original order
    Concat,
    /// Keep the single longest successful response verbatim
    Best,
    /// Ask a provider to merge everything; falls back to concat
    Synthesize,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MergeStrategy::Concat => "concat",
            MergeStrategy::Best => "best",
            MergeStrategy::Synthesize => "synthesize",
        };
        f.write_str(s)
    }
}

/// One planned subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskDef {
    /// Position-stable identifier
    pub id: u32,
    /// What the subtask asks for
    pub task: String,
    /// Advisory skill tag (reasoning, code, creative, analysis, general)
    pub skill: String,
}

/// Per-subtask result metadata returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskReport {
    /// Subtask id
    pub id: u32,
    /// Subtask text
    pub task: String,
    /// Skill tag
    pub skill: String,
    /// Provider that executed it
    pub provider: String,
    /// That provider's service group
    pub engine: String,
    /// Observed latency
    pub latency_ms: u64,
    /// Response length in bytes
    pub response_length: usize,
}

/// Structured decomposition outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionReport {
    /// Decomposition identifier
    pub id: String,
    /// Completed subtasks in original order
    pub subtasks: Vec<SubtaskReport>,
    /// Subtasks that failed
    pub failed_count: usize,
    /// Subtasks planned (completed + failed)
    pub total_subtasks: usize,
    /// Merge strategy applied
    pub merge_strategy: MergeStrategy,
    /// Distinct providers that completed subtasks
    pub providers_used: Vec<String>,
}

/// A successful `decompose` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeReply {
    /// Merged response text
    pub response: String,
    /// Per-subtask detail
    pub decomposition: DecompositionReport,
    /// Wall time for the whole fan-out including merge
    pub latency_ms: u64,
}

/// A subtask that completed, request-scoped
pub(crate) struct CompletedSubtask {
    pub def: SubtaskDef,
    pub provider: String,
    pub engine: String,
    pub pricing: ProviderPricing,
    pub response: String,
    pub latency_ms: u64,
}

struct FailedSubtask {
    def: SubtaskDef,
    provider: String,
    error: String,
}

enum SubtaskExecution {
    Completed(CompletedSubtask),
    Failed(FailedSubtask),
}

impl Gateway {
    /// Decompose a complex task, fan it out across the available providers,
    /// and merge the results.
    pub async fn decompose(&self, task: &str, opts: DecomposeOptions) -> Result<DecomposeReply> {
        self.counters.total_requests.fetch_add(1, Relaxed);
        let decomp_id = format!("decomp-{}", Uuid::new_v4().simple());
        let started = Instant::now();
        let started_at = Utc::now();

        let available = self.registry.available();
        if available.is_empty() {
            return Err(GatewayError::NoProvidersAvailable);
        }

        let max_subtasks = opts
            .max_subtasks
            .unwrap_or(DEFAULT_MAX_SUBTASKS)
            .min(available.len())
            .max(1);
        let merge_strategy = opts.merge_strategy.unwrap_or(MergeStrategy::Synthesize);

        // The highest-priority available provider plans the split
        let defs = self.plan_subtasks(&available[0], task, max_subtasks).await;
        let total_subtasks = defs.len();
        debug!(decomp_id = %decomp_id, subtasks = total_subtasks, "decomposition planned");

        let call_opts = CallOptions {
            temperature: Some(opts.temperature.unwrap_or(0.7)),
            max_tokens: Some(opts.max_tokens.unwrap_or(2_048)),
        };
        let handles: Vec<_> = defs
            .into_iter()
            .enumerate()
            .map(|(i, def)| {
                let provider = available[i % available.len()].clone();
                self.registry.consume_rate(provider.name());
                tokio::spawn(run_subtask(
                    self.registry.clone(),
                    provider,
                    def,
                    opts.system.clone(),
                    call_opts,
                    self.config.provider_call_timeout(),
                ))
            })
            .collect();

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok(SubtaskExecution::Completed(subtask)) => completed.push(subtask),
                Ok(SubtaskExecution::Failed(subtask)) => failed.push(subtask),
                Err(err) => debug!(error = %err, "subtask task join failed"),
            }
        }

        if completed.is_empty() {
            return Err(GatewayError::AllSubtasksFailed {
                failed: failed
                    .iter()
                    .map(|f| format!("{} ({}): {}", f.def.task, f.provider, f.error))
                    .collect(),
            });
        }

        let merged = match merge_strategy {
            MergeStrategy::Concat => merge::concat(&completed),
            MergeStrategy::Best => merge::best(&completed),
            MergeStrategy::Synthesize => {
                merge::synthesize(self, task, &completed, &available[0]).await
            }
        };

        for subtask in &completed {
            let cost = estimate_cost(&subtask.pricing, &subtask.def.task, &subtask.response);
            self.ledger.record(cost);
        }

        let providers_used = distinct_providers(&completed);
        let total_latency_ms = started.elapsed().as_millis() as u64;
        self.audit.append(AuditEntry::Decompose(DecomposeAudit {
            decomp_id: decomp_id.clone(),
            started_at,
            task: task.chars().take(200).collect(),
            subtasks: completed.len(),
            failed: failed.len(),
            providers: providers_used.clone(),
            total_latency_ms,
        }));

        info!(
            decomp_id = %decomp_id,
            subtasks = completed.len(),
            failed = failed.len(),
            latency_ms = total_latency_ms,
            "decomposition merged"
        );
        Ok(DecomposeReply {
            response: merged,
            decomposition: DecompositionReport {
                id: decomp_id,
                subtasks: completed
                    .iter()
                    .map(|c| SubtaskReport {
                        id: c.def.id,
                        task: c.def.task.clone(),
                        skill: c.def.skill.clone(),
                        provider: c.provider.clone(),
                        engine: c.engine.clone(),
                        latency_ms: c.latency_ms,
                        response_length: c.response.len(),
                    })
                    .collect(),
                failed_count: failed.len(),
                total_subtasks,
                merge_strategy,
                providers_used,
            },
            latency_ms: total_latency_ms,
        })
    }

    /// Ask the decomposer provider for a subtask plan, falling back to the
    /// deterministic split chain on any failure
    async fn plan_subtasks(
        &self,
        decomposer: &Arc<RegisteredProvider>,
        task: &str,
        max: usize,
    ) -> Vec<SubtaskDef> {
        let prompt = split::decomposition_prompt(task, max);
        let opts = CallOptions {
            temperature: Some(0.3),
            max_tokens: Some(1_024),
        };
        match guarded_chat(
            decomposer,
            &prompt,
            None,
            &opts,
            self.config.provider_call_timeout(),
        )
        .await
        {
            Ok(completion) => split::parse_subtasks(&completion.response, max)
                .unwrap_or_else(|| split::fallback_split(task, max)),
            Err(err) => {
                debug!(error = %err, "decomposer call failed, using fallback split");
                split::fallback_split(task, max)
            }
        }
    }
}

/// Execute one subtask on its assigned provider, updating that provider's
/// health record either way
async fn run_subtask(
    registry: Arc<ProviderRegistry>,
    provider: Arc<RegisteredProvider>,
    def: SubtaskDef,
    system: Option<String>,
    opts: CallOptions,
    timeout: Option<Duration>,
) -> SubtaskExecution {
    let message = match &system {
        Some(system) => format!("{system}\n\n{}", def.task),
        None => def.task.clone(),
    };
    let start = Instant::now();
    let result = guarded_chat(&provider, &message, None, &opts, timeout).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(completion) => {
            registry.record_success(provider.name(), latency_ms);
            SubtaskExecution::Completed(CompletedSubtask {
                def,
                provider: provider.name().to_string(),
                engine: provider.service_group.clone(),
                pricing: provider.config.pricing,
                response: completion.response,
                latency_ms,
            })
        }
        Err(err) => {
            registry.record_failure(provider.name());
            SubtaskExecution::Failed(FailedSubtask {
                def,
                provider: provider.name().to_string(),
                error: err.to_string(),
            })
        }
    }
}

fn distinct_providers(completed: &[CompletedSubtask]) -> Vec<String> {
    let mut seen = Vec::new();
    for subtask in completed {
        if !seen.contains(&subtask.provider) {
            seen.push(subtask.provider.clone());
        }
    }
    seen
}
