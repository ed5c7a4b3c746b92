//! Similarity-based response cache
//!
//! Backed by an external vector memory store the gateway does not own.
//! Everything here is best-effort: a store that errors, returns garbage, or
//! is simply absent degrades to a cache miss and never surfaces to callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Metadata kind tag marking entries this gateway proved through a race
pub const PROVEN_KIND: &str = "gateway-proven";

/// How much of the question is stored as vector content
const CONTENT_LIMIT: usize = 2_000;
/// How much of the response is stored in metadata
const RESPONSE_LIMIT: usize = 3_000;
/// How much of the source question is stored in metadata
const QUESTION_LIMIT: usize = 500;

/// External vector memory contract.
///
/// Both operations are best-effort collaborators; the gateway treats every
/// error as a miss / no-op.
#[async_trait]
pub trait SemanticMemory: Send + Sync {
    /// Nearest-neighbor query over stored content, filtered by metadata kind
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        kind: &str,
    ) -> anyhow::Result<Vec<MemoryHit>>;

    /// Store an entry for future similarity lookups
    async fn store(&self, entry: MemoryEntry) -> anyhow::Result<()>;
}

/// One similarity match from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    /// Similarity score in `[0, 1]`
    pub score: f64,
    /// The stored content span
    pub content: String,
    /// Stored metadata
    pub metadata: MemoryMetadata,
}

/// An entry to store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Content the store indexes by similarity
    pub content: String,
    /// Metadata returned alongside hits
    pub metadata: MemoryMetadata,
}

/// Metadata carried with every proven answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryMetadata {
    /// Entry kind tag; proven answers use [`PROVEN_KIND`]
    pub kind: String,
    /// The cached response text
    pub response: Option<String>,
    /// Service group that produced the response
    pub engine: Option<String>,
    /// Concrete model, when known
    pub model: Option<String>,
    /// The question that produced the response
    pub source_question: Option<String>,
    /// When the answer was proven
    pub proven_at: Option<DateTime<Utc>>,
    /// How many providers were in the proving pool
    pub race_pool: Option<usize>,
}

/// A usable semantic cache hit
#[derive(Debug, Clone)]
pub struct SemanticHit {
    /// The cached response text
    pub response: String,
    /// Similarity score, rounded to 4 decimal places
    pub similarity: f64,
    /// The question the cached answer originally addressed
    pub source_question: String,
    /// Service group that proved the answer
    pub proven_by: String,
}

/// Best-effort wrapper over a [`SemanticMemory`] collaborator
pub struct SemanticCache {
    memory: Arc<dyn SemanticMemory>,
    threshold: f64,
}

impl SemanticCache {
    /// Wrap a memory store with a hit threshold
    pub fn new(memory: Arc<dyn SemanticMemory>, threshold: f64) -> Self {
        Self { memory, threshold }
    }

    /// Query for a semantically similar proven answer.
    ///
    /// Returns `None` on low similarity, missing response metadata, or any
    /// store error.
    pub async fn lookup(&self, message: &str) -> Option<SemanticHit> {
        let hits = match self.memory.query(message, 1, PROVEN_KIND).await {
            Ok(hits) => hits,
            Err(err) => {
                debug!(error = %err, "semantic cache query failed, treating as miss");
                return None;
            }
        };
        let best = hits.into_iter().next()?;
        if best.score < self.threshold {
            return None;
        }
        let response = best.metadata.response?;
        let source_question = best
            .metadata
            .source_question
            .unwrap_or_else(|| best.content.chars().take(200).collect());
        Some(SemanticHit {
            response,
            similarity: (best.score * 10_000.0).round() / 10_000.0,
            source_question,
            proven_by: best.metadata.engine.unwrap_or_else(|| "unknown".to_string()),
        })
    }

    /// Store a race-proven answer in the background. The caller's return path
    /// never waits on the store, and store failures are logged and dropped.
    pub fn store_proven(
        &self,
        message: &str,
        response: &str,
        engine: &str,
        model: Option<&str>,
        race_pool: usize,
    ) {
        let entry = MemoryEntry {
            content: truncate(message, CONTENT_LIMIT),
            metadata: MemoryMetadata {
                kind: PROVEN_KIND.to_string(),
                response: Some(truncate(response, RESPONSE_LIMIT)),
                engine: Some(engine.to_string()),
                model: model.map(str::to_string),
                source_question: Some(truncate(message, QUESTION_LIMIT)),
                proven_at: Some(Utc::now()),
                race_pool: Some(race_pool),
            },
        };
        let memory = self.memory.clone();
        tokio::spawn(async move {
            if let Err(err) = memory.store(entry).await {
                warn!(error = %err, "semantic cache store failed");
            }
        });
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
