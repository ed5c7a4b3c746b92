//! Exact-match and semantic cache behavior through the public surface

use crate::common::{RecordingMemory, ScriptedProvider};
use polyroute::{
    CacheConfig, ChatOptions, Gateway, GatewayConfig, MemoryHit, MemoryMetadata, ProviderConfig,
};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn cached_reply_expires_after_ttl() {
    let gateway = Gateway::new(GatewayConfig::default());
    let solo = ScriptedProvider::answering("remembered");
    gateway.register_provider(ProviderConfig::new("solo"), solo.clone());

    gateway.chat("hello", ChatOptions::default()).await.unwrap();

    tokio::time::advance(Duration::from_millis(299_000)).await;
    let hit = gateway.chat("hello", ChatOptions::default()).await.unwrap();
    assert!(hit.cached);
    assert_eq!(hit.latency_ms, 0);
    assert_eq!(solo.calls(), 1);

    tokio::time::advance(Duration::from_millis(2_000)).await;
    let miss = gateway.chat("hello", ChatOptions::default()).await.unwrap();
    assert!(!miss.cached, "entry expired and was re-routed");
    assert_eq!(solo.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn different_system_prompts_cache_separately() {
    let gateway = Gateway::new(GatewayConfig::default());
    let solo = ScriptedProvider::answering("same text either way");
    gateway.register_provider(ProviderConfig::new("solo"), solo.clone());

    let with_system = ChatOptions {
        system: Some("be terse".to_string()),
        ..Default::default()
    };
    gateway.chat("hello", with_system.clone()).await.unwrap();
    gateway.chat("hello", ChatOptions::default()).await.unwrap();
    assert_eq!(solo.calls(), 2, "system prompt is part of the cache key");

    let second = gateway.chat("hello", with_system).await.unwrap();
    assert!(second.cached);
    assert_eq!(solo.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn capacity_eviction_drops_oldest_inserted() {
    let config = GatewayConfig {
        cache: CacheConfig {
            max_entries: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    let gateway = Gateway::new(config);
    let solo = ScriptedProvider::answering("filler");
    gateway.register_provider(ProviderConfig::new("solo"), solo.clone());

    gateway.chat("first", ChatOptions::default()).await.unwrap();
    gateway.chat("second", ChatOptions::default()).await.unwrap();

    // Read "first" so LRU-style eviction would protect it
    assert!(gateway.chat("first", ChatOptions::default()).await.unwrap().cached);

    gateway.chat("third", ChatOptions::default()).await.unwrap();
    let refetched = gateway.chat("first", ChatOptions::default()).await.unwrap();
    assert!(!refetched.cached, "FIFO evicted the oldest-inserted entry");
}

#[tokio::test(start_paused = true)]
async fn semantic_tier_serves_proven_answers() {
    let memory = RecordingMemory::with_hit(MemoryHit {
        score: 0.91,
        content: "how do rate limits work".to_string(),
        metadata: MemoryMetadata {
            kind: "gateway-proven".to_string(),
            response: Some("one window per provider".to_string()),
            engine: Some("alpha-pool".to_string()),
            model: None,
            source_question: Some("how do rate limits work".to_string()),
            proven_at: None,
            race_pool: Some(2),
        },
    });
    let gateway = Gateway::new(GatewayConfig::default()).with_semantic_memory(memory);
    let solo = ScriptedProvider::answering("never consulted");
    gateway.register_provider(ProviderConfig::new("solo"), solo.clone());

    let reply = gateway
        .chat("what is a rate limit window", ChatOptions::default())
        .await
        .unwrap();
    assert!(reply.cached);
    assert_eq!(reply.engine, "semantic-cache");
    assert_eq!(reply.response, "one window per provider");
    let provenance = reply.semantic.unwrap();
    assert_eq!(provenance.proven_by, "alpha-pool");
    assert_eq!(provenance.source_question, "how do rate limits work");
    assert_eq!(solo.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn wins_are_fed_back_into_semantic_memory() {
    let memory = RecordingMemory::empty();
    let gateway = Gateway::new(GatewayConfig::default()).with_semantic_memory(memory.clone());
    gateway.register_provider(ProviderConfig::new("solo"), ScriptedProvider::answering("proven answer"));

    gateway.chat("hello", ChatOptions::default()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while memory.stored().is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("background store completed");

    let stored = memory.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].metadata.kind, "gateway-proven");
    assert_eq!(stored[0].metadata.response.as_deref(), Some("proven answer"));
    assert_eq!(stored[0].metadata.engine.as_deref(), Some("solo-pool"));
    assert!(stored[0].metadata.proven_at.is_some());
}
