//! Shared test infrastructure

use async_trait::async_trait;
use parking_lot::Mutex;
use polyroute::{
    CallOptions, ChatCompletion, ChatProvider, Embedding, MemoryEntry, MemoryHit, ProviderError,
    SemanticMemory,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A provider whose behavior is scripted per test: fixed response text,
/// artificial latency, and an optional failure budget.
pub struct ScriptedProvider {
    response: String,
    delay: Duration,
    fail_first: u64,
    always_fail: bool,
    embedding: Option<Vec<f32>>,
    calls: AtomicU64,
}

impl ScriptedProvider {
    pub fn answering(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay: Duration::ZERO,
            fail_first: 0,
            always_fail: false,
            embedding: None,
            calls: AtomicU64::new(0),
        })
    }

    pub fn answering_after(response: &str, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay: Duration::from_millis(delay_ms),
            fail_first: 0,
            always_fail: false,
            embedding: None,
            calls: AtomicU64::new(0),
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Arc::new(Self {
            response: String::new(),
            delay: Duration::ZERO,
            fail_first: 0,
            always_fail: true,
            embedding: None,
            calls: AtomicU64::new(0),
        })
    }

    /// Fails the first `n` calls, then answers normally
    pub fn failing_first(n: u64, response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay: Duration::ZERO,
            fail_first: n,
            always_fail: false,
            embedding: None,
            calls: AtomicU64::new(0),
        })
    }

    pub fn embedder(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            response: "embedder online".to_string(),
            delay: Duration::ZERO,
            fail_first: 0,
            always_fail: false,
            embedding: Some(vector),
            calls: AtomicU64::new(0),
        })
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn chat(
        &self,
        _message: &str,
        _system: Option<&str>,
        _opts: &CallOptions,
    ) -> Result<ChatCompletion, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.always_fail || call < self.fail_first {
            return Err(ProviderError::Request("scripted failure".to_string()));
        }
        Ok(ChatCompletion::text(self.response.clone()))
    }

    async fn embed(
        &self,
        _text: &str,
        _opts: &CallOptions,
    ) -> Result<Embedding, ProviderError> {
        match &self.embedding {
            Some(vector) => Ok(Embedding {
                dimensions: vector.len(),
                embedding: vector.clone(),
            }),
            None => Err(ProviderError::Unsupported("embed")),
        }
    }
}

/// In-memory semantic store that returns a scripted hit list and records
/// everything stored into it.
pub struct RecordingMemory {
    hits: Mutex<Vec<MemoryHit>>,
    stored: Mutex<Vec<MemoryEntry>>,
}

impl RecordingMemory {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            hits: Mutex::new(Vec::new()),
            stored: Mutex::new(Vec::new()),
        })
    }

    pub fn with_hit(hit: MemoryHit) -> Arc<Self> {
        Arc::new(Self {
            hits: Mutex::new(vec![hit]),
            stored: Mutex::new(Vec::new()),
        })
    }

    pub fn stored(&self) -> Vec<MemoryEntry> {
        self.stored.lock().clone()
    }
}

#[async_trait]
impl SemanticMemory for RecordingMemory {
    async fn query(
        &self,
        _text: &str,
        _top_k: usize,
        _kind: &str,
    ) -> anyhow::Result<Vec<MemoryHit>> {
        Ok(self.hits.lock().clone())
    }

    async fn store(&self, entry: MemoryEntry) -> anyhow::Result<()> {
        self.stored.lock().push(entry);
        Ok(())
    }
}

/// Wait until the audit ring holds at least `entries` entries, driving the
/// paused clock forward so background racers can settle.
pub async fn wait_for_audit(gateway: &polyroute::Gateway, entries: usize) {
    tokio::time::timeout(Duration::from_secs(300), async {
        while gateway.audit(usize::MAX).len() < entries {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("audit entries appended");
}
