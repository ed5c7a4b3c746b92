//! # polyroute
//!
//! A routing gateway over interchangeable LLM providers. One `chat` /
//! `embed` / `decompose` surface with automatic provider selection,
//! failover, cost tracking, and response caching.
//!
//! ## Features
//!
//! - **Racing**: dispatch every available provider concurrently and return
//!   the first non-blank response; losers settle in the background and feed
//!   the audit trail
//! - **Health tracking**: per-provider circuit breakers, EMA latency, and
//!   rolling rate windows drive availability in real time
//! - **Two-tier caching**: exact-match FIFO cache plus an optional
//!   similarity cache backed by an external vector memory store
//! - **Cost visibility**: per-call cost estimates accumulated against daily
//!   and monthly budgets (observational, never blocking)
//! - **Task decomposition**: split a complex task, fan the subtasks out
//!   across providers in parallel, and merge the results
//! - **Tuning signals**: an audit ring of routing decisions distilled into
//!   concrete optimization recommendations
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use polyroute::{Gateway, GatewayConfig, ProviderConfig, ChatOptions};
//! use std::sync::Arc;
//!
//! # fn adapters() -> (Arc<dyn polyroute::ChatProvider>, Arc<dyn polyroute::ChatProvider>) { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (claude, gemini) = adapters();
//!     let gateway = Gateway::new(GatewayConfig::default());
//!     gateway.register_provider(ProviderConfig::new("claude").with_priority(10), claude);
//!     gateway.register_provider(ProviderConfig::new("gemini").with_priority(20), gemini);
//!
//!     let reply = gateway.chat("Hello, what can you do?", ChatOptions::default()).await?;
//!     println!("[{}] {}", reply.engine, reply.response);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::{
    BudgetConfig, CacheConfig, Capability, GatewayConfig, ProviderConfig, ProviderLimits,
    ProviderPricing,
};
pub use utils::error::{GatewayError, Result};

// Gateway surface
pub use core::gateway::{
    ChatOptions, ChatReply, EmbedReply, Gateway, GatewayStats, Priority, ProviderStatus, RaceTag,
    SemanticProvenance,
};

// Provider adapter contract
pub use core::providers::{
    CallOptions, ChatCompletion, ChatProvider, Embedding, ProviderError, TokenUsage,
};

// Semantic memory collaborator contract
pub use core::cache::{MemoryEntry, MemoryHit, MemoryMetadata, SemanticMemory};

// Decomposition
pub use core::decompose::{
    DecomposeOptions, DecomposeReply, DecompositionReport, MergeStrategy, SubtaskReport,
};

// Introspection
pub use core::audit::{
    AuditEntry, CallStatus, DecomposeAudit, OptimizationReport, OptimizationSignal, RaceAudit,
    RaceOutcome, SignalKind,
};
pub use core::cost::BudgetSnapshot;
pub use core::registry::{HealthSnapshot, RateSnapshot};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
