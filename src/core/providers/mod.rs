//! Provider adapter contract
//!
//! The gateway never talks to a vendor API itself; it dispatches through
//! adapters implementing [`ChatProvider`]. Adapters translate the unified
//! request into vendor-specific wire calls and MUST report failure through
//! `Err` — returning a "successful" payload that embeds an error would
//! defeat health tracking and racing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options forwarded verbatim to a provider call
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CallOptions {
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Response token budget
    pub max_tokens: Option<u32>,
}

/// A completed chat call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Response text
    pub response: String,
    /// Concrete model that served the call, when the adapter knows it
    pub model: Option<String>,
    /// Token usage as reported by the vendor
    pub usage: Option<TokenUsage>,
}

impl ChatCompletion {
    /// A completion carrying only response text
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            model: None,
            usage: None,
        }
    }
}

/// Vendor-reported token usage
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens consumed
    pub input_tokens: u32,
    /// Output tokens produced
    pub output_tokens: u32,
}

/// A completed embedding call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    /// The embedding vector
    pub embedding: Vec<f32>,
    /// Vector dimensionality
    pub dimensions: usize,
}

/// Errors a provider adapter can surface.
///
/// These never propagate to gateway callers; the call site converts each one
/// into a health-record failure and moves on.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The vendor rejected or failed the request
    #[error("request failed: {0}")]
    Request(String),

    /// The gateway-enforced per-call timeout elapsed
    #[error("request timed out")]
    Timeout,

    /// The adapter does not implement the requested operation
    #[error("capability not supported: {0}")]
    Unsupported(&'static str),

    /// Anything else the adapter's stack produced
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A pluggable LLM backend.
///
/// Implementations must be cheap to share (`Arc<dyn ChatProvider>`) and are
/// called concurrently during races and decomposition fan-out.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Answer a chat message.
    ///
    /// `system` is an optional system prompt; `opts` carry sampling
    /// parameters the adapter should forward when the vendor supports them.
    async fn chat(
        &self,
        message: &str,
        system: Option<&str>,
        opts: &CallOptions,
    ) -> Result<ChatCompletion, ProviderError>;

    /// Embed a text span.
    ///
    /// Default implementation reports the capability as unsupported; only
    /// adapters registered with [`Capability::Embed`](crate::config::Capability::Embed)
    /// are ever asked.
    async fn embed(&self, text: &str, opts: &CallOptions) -> Result<Embedding, ProviderError> {
        let _ = (text, opts);
        Err(ProviderError::Unsupported("embed"))
    }
}
