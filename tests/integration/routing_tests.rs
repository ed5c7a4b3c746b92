//! Racing, sequential dispatch, circuit breaking, and rate windows

use crate::common::{ScriptedProvider, wait_for_audit};
use polyroute::{
    AuditEntry, CallOptions, ChatOptions, Gateway, GatewayConfig, ProviderConfig, ProviderLimits,
};
use std::time::Duration;

fn no_cache() -> ChatOptions {
    ChatOptions {
        cache: Some(false),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn race_winner_is_decided_by_arrival_not_priority() {
    let gateway = Gateway::new(GatewayConfig::default());
    let alpha = ScriptedProvider::answering_after("Hello", 120);
    let beta = ScriptedProvider::answering_after("Hi there", 40);
    gateway.register_provider(ProviderConfig::new("alpha").with_priority(10), alpha.clone());
    gateway.register_provider(ProviderConfig::new("beta").with_priority(20), beta.clone());

    let reply = gateway.chat("quick greeting please", no_cache()).await.unwrap();
    assert_eq!(reply.response, "Hi there", "beta answered first despite lower priority");
    assert_eq!(reply.engine, "beta-pool");
    assert_eq!(alpha.calls(), 1, "racing dispatches every available provider");
    assert_eq!(beta.calls(), 1);

    wait_for_audit(&gateway, 1).await;
    let entries = gateway.audit(1);
    let AuditEntry::Race(race) = &entries[0] else {
        panic!("expected a race entry");
    };
    assert_eq!(race.winner.as_ref().unwrap().source, "beta");
    assert_eq!(race.late_responses[0].source, "alpha");
    assert_eq!(race.late_responses[0].delta_ms, Some(80));
}

#[tokio::test(start_paused = true)]
async fn sequential_mode_walks_priority_order() {
    let gateway = Gateway::new(GatewayConfig::default());
    let alpha = ScriptedProvider::always_failing();
    let beta = ScriptedProvider::answering("beta here");
    let gamma = ScriptedProvider::answering("gamma here");
    gateway.register_provider(ProviderConfig::new("alpha").with_priority(10), alpha.clone());
    gateway.register_provider(ProviderConfig::new("beta").with_priority(20), beta.clone());
    gateway.register_provider(ProviderConfig::new("gamma").with_priority(30), gamma.clone());

    let reply = gateway
        .chat(
            "walk the list in order",
            ChatOptions {
                sequential: true,
                cache: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(reply.response, "beta here");
    assert_eq!(alpha.calls(), 1);
    assert_eq!(beta.calls(), 1);
    assert_eq!(gamma.calls(), 0, "dispatch stops at the first success");
}

#[tokio::test(start_paused = true)]
async fn circuit_breaker_excludes_then_readmits() {
    let gateway = Gateway::new(GatewayConfig::default());
    // Fails five times, then recovers
    let flaky = ScriptedProvider::failing_first(5, "finally up again");
    gateway.register_provider(ProviderConfig::new("flaky"), flaky.clone());

    for _ in 0..5 {
        let err = gateway.chat("are you up?", no_cache()).await.unwrap_err();
        assert_eq!(err.to_string(), "all-providers-failed");
    }

    // Circuit is open now: the provider is not even dispatched
    let err = gateway.chat("are you up?", no_cache()).await.unwrap_err();
    assert_eq!(err.to_string(), "no-providers-available");
    assert_eq!(flaky.calls(), 5);

    // After the cooldown the provider is probed again and its success
    // restores eligibility immediately
    tokio::time::advance(Duration::from_millis(60_001)).await;
    let reply = gateway.chat("are you up?", no_cache()).await.unwrap();
    assert_eq!(reply.response, "finally up again");

    let health = gateway.stats().providers[0].health.clone().unwrap();
    assert!(health.healthy);
    assert_eq!(health.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn rate_window_enforces_rpm_and_recovers() {
    let gateway = Gateway::new(GatewayConfig::default());
    let tight = ScriptedProvider::answering("within quota");
    gateway.register_provider(
        ProviderConfig::new("tight").with_limits(ProviderLimits { rpm: 2, tpm: 100_000 }),
        tight.clone(),
    );

    gateway.chat("one", no_cache()).await.unwrap();
    gateway.chat("two", no_cache()).await.unwrap();
    let err = gateway.chat("three", no_cache()).await.unwrap_err();
    assert_eq!(err.to_string(), "no-providers-available");
    assert_eq!(tight.calls(), 2);

    tokio::time::advance(Duration::from_millis(60_001)).await;
    gateway.chat("four", no_cache()).await.unwrap();
    assert_eq!(tight.calls(), 3, "fresh window admits dispatches again");
}

#[tokio::test(start_paused = true)]
async fn losing_racers_keep_updating_health_after_return() {
    let gateway = Gateway::new(GatewayConfig::default());
    let fast = ScriptedProvider::answering_after("fast", 10);
    let doomed = ScriptedProvider::always_failing();
    gateway.register_provider(ProviderConfig::new("fast").with_priority(10), fast);
    gateway.register_provider(ProviderConfig::new("doomed").with_priority(20), doomed);

    let reply = gateway.chat("who answers first", no_cache()).await.unwrap();
    assert_eq!(reply.response, "fast");

    // The failing racer settles in the background and its failure lands in
    // the health record
    wait_for_audit(&gateway, 1).await;
    let stats = gateway.stats();
    let doomed = stats.providers.iter().find(|p| p.name == "doomed").unwrap();
    assert_eq!(doomed.health.as_ref().unwrap().total_errors, 1);
}

#[tokio::test]
async fn embed_walks_capable_providers_sequentially() {
    let gateway = Gateway::new(GatewayConfig::default());
    gateway.register_provider(
        ProviderConfig::new("chatty").with_priority(10),
        ScriptedProvider::answering("text only"),
    );
    gateway.register_provider(
        ProviderConfig::new("vectors")
            .with_priority(20)
            .with_capabilities(vec![polyroute::Capability::Chat, polyroute::Capability::Embed]),
        ScriptedProvider::embedder(vec![0.5; 8]),
    );

    let reply = gateway.embed("embed me", CallOptions::default()).await.unwrap();
    assert_eq!(reply.dimensions, 8);
    assert_eq!(reply.engine, "vectors-pool");
}
