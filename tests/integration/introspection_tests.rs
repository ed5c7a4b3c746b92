//! Stats, audit access, and the optimization advisor

use crate::common::{ScriptedProvider, wait_for_audit};
use polyroute::{
    BudgetConfig, ChatOptions, Gateway, GatewayConfig, ProviderConfig, SignalKind,
};

fn no_cache() -> ChatOptions {
    ChatOptions {
        cache: Some(false),
        ..Default::default()
    }
}

fn racing_pair() -> Gateway {
    let gateway = Gateway::new(GatewayConfig::default());
    gateway.register_provider(
        ProviderConfig::new("alpha").with_priority(10),
        ScriptedProvider::answering_after("slow and steady", 100),
    );
    gateway.register_provider(
        ProviderConfig::new("beta").with_priority(20),
        ScriptedProvider::answering_after("quick", 10),
    );
    gateway
}

#[tokio::test(start_paused = true)]
async fn stats_expose_provider_and_budget_state() {
    let gateway = racing_pair();
    gateway.chat("give me the quick answer", no_cache()).await.unwrap();
    wait_for_audit(&gateway, 1).await;

    let stats = gateway.stats();
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.wins["beta"], 1);
    assert_eq!(stats.providers.len(), 2);
    assert_eq!(stats.providers[0].name, "alpha", "priority order");
    assert_eq!(stats.providers[0].service_group, "alpha-pool");
    assert!(stats.providers[0].health.is_some());
    assert_eq!(stats.providers[0].rate.as_ref().unwrap().used, 1);
    assert_eq!(stats.audit_entries, 1);
    assert!(stats.budget.daily_spent > 0.0);
}

#[tokio::test(start_paused = true)]
async fn audit_returns_the_most_recent_entries() {
    let gateway = racing_pair();
    for i in 0..3 {
        gateway.chat(&format!("question number {i}"), no_cache()).await.unwrap();
    }
    wait_for_audit(&gateway, 3).await;

    assert_eq!(gateway.audit(2).len(), 2);
    assert_eq!(gateway.audit(10).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn advisor_flags_providers_that_never_win() {
    let gateway = racing_pair();
    for i in 0..10 {
        gateway.chat(&format!("round {i}"), no_cache()).await.unwrap();
    }
    wait_for_audit(&gateway, 10).await;

    let report = gateway.optimizations();
    assert_eq!(report.win_counts["beta"], 10);
    let never: Vec<_> = report
        .signals
        .iter()
        .filter(|s| s.kind == SignalKind::NeverWins)
        .collect();
    assert_eq!(never.len(), 1);
    assert_eq!(never[0].provider.as_deref(), Some("alpha"));
}

#[tokio::test(start_paused = true)]
async fn advisor_warns_when_daily_budget_runs_hot() {
    let config = GatewayConfig {
        budget: BudgetConfig {
            daily: 0.0001,
            monthly: 100.0,
        },
        ..Default::default()
    };
    let gateway = Gateway::new(config);
    gateway.register_provider(ProviderConfig::new("solo"), ScriptedProvider::answering("won"));

    let long_input = "x".repeat(400);
    gateway.chat(&long_input, no_cache()).await.unwrap();

    let report = gateway.optimizations();
    assert!(
        report
            .signals
            .iter()
            .any(|s| s.kind == SignalKind::BudgetWarning),
        "spend crossed 80% of the daily cap"
    );
}
