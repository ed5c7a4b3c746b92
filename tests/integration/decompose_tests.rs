//! Decomposition fan-out through the public surface

use crate::common::ScriptedProvider;
use polyroute::{
    AuditEntry, DecomposeOptions, Gateway, GatewayConfig, MergeStrategy, ProviderConfig,
};

fn gateway_with(names: &[&str]) -> Gateway {
    let gateway = Gateway::new(GatewayConfig::default());
    for (i, name) in names.iter().enumerate() {
        gateway.register_provider(
            ProviderConfig::new(*name).with_priority((i as u32 + 1) * 10),
            ScriptedProvider::answering(&format!("{name} handled its piece")),
        );
    }
    gateway
}

#[tokio::test]
async fn fan_out_spreads_subtasks_and_merges_in_order() {
    let gateway = gateway_with(&["alpha", "beta", "gamma"]);

    let reply = gateway
        .decompose(
            "Design the schema carefully. Implement the storage layer. Write the migration tooling.",
            DecomposeOptions {
                merge_strategy: Some(MergeStrategy::Concat),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let report = &reply.decomposition;
    assert_eq!(report.total_subtasks, 3);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.merge_strategy, MergeStrategy::Concat);
    let providers: Vec<_> = report.subtasks.iter().map(|s| s.provider.as_str()).collect();
    assert_eq!(providers, ["alpha", "beta", "gamma"], "round-robin assignment");

    let first = reply.response.find("## Design the schema carefully").unwrap();
    let second = reply.response.find("## Implement the storage layer").unwrap();
    assert!(first < second, "concat preserves original subtask order");
}

#[tokio::test]
async fn synthesize_merge_runs_one_more_provider_call() {
    let gateway = Gateway::new(GatewayConfig::default());
    let alpha = ScriptedProvider::answering("alpha text");
    let beta = ScriptedProvider::answering("beta text");
    gateway.register_provider(ProviderConfig::new("alpha").with_priority(10), alpha.clone());
    gateway.register_provider(ProviderConfig::new("beta").with_priority(20), beta.clone());

    let reply = gateway
        .decompose("Ship the feature", DecomposeOptions::default())
        .await
        .unwrap();
    assert!(!reply.response.is_empty());
    // alpha planned the split, ran one subtask, and performed the merge
    assert_eq!(alpha.calls(), 3);
    assert_eq!(beta.calls(), 1);
}

#[tokio::test]
async fn decomposition_lands_in_budget_and_audit() {
    let gateway = gateway_with(&["alpha", "beta"]);
    gateway
        .decompose(
            "Collect the requirements from the team. Draft the proposal document.",
            DecomposeOptions {
                merge_strategy: Some(MergeStrategy::Best),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stats = gateway.stats();
    assert_eq!(stats.total_requests, 1);
    assert!(stats.budget.daily_spent > 0.0);
    assert!(stats.budget.monthly_spent > 0.0);

    let entries = gateway.audit(10);
    assert_eq!(entries.len(), 1);
    let AuditEntry::Decompose(entry) = &entries[0] else {
        panic!("expected a decompose entry");
    };
    assert_eq!(entry.subtasks, 2);
    assert_eq!(entry.failed, 0);
    assert_eq!(entry.providers, ["alpha", "beta"]);
}
