//! Racing dispatch
//!
//! Every eligible provider is dispatched concurrently; the first non-blank
//! response wins and unblocks the caller. Losing calls are never cancelled:
//! they run to completion on detached tasks, update health records as they
//! settle, and the last one to settle publishes the audit entry — possibly
//! long after the caller moved on.

use super::types::RouteSuccess;
use super::{Gateway, guarded_chat};
use crate::core::audit::{
    AuditEntry, AuditLog, CallStatus, OptimizationSignal, RaceAudit, RaceOutcome, SignalKind,
};
use crate::core::providers::CallOptions;
use crate::core::registry::{ProviderRegistry, RegisteredProvider};
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::warn;

/// Mutable state shared by all racers of one race
#[derive(Default)]
struct RaceBoard {
    responded: bool,
    winner: Option<RouteSuccess>,
    winner_outcome: Option<RaceOutcome>,
    results: Vec<RaceOutcome>,
    late_responses: Vec<RaceOutcome>,
    errors: Vec<RaceOutcome>,
    signals: Vec<OptimizationSignal>,
    settled: usize,
}

/// Immutable race context plus the shared board
struct RaceShared {
    board: Mutex<RaceBoard>,
    notify: Notify,
    race_id: String,
    providers: Vec<String>,
    started: Instant,
    started_at: DateTime<Utc>,
    total: usize,
    audit: Arc<AuditLog>,
}

impl Gateway {
    /// Race a request across the given providers, returning at the first
    /// non-blank response or failing once everyone settled / the ceiling
    /// fired.
    pub(crate) async fn race_providers(
        &self,
        providers: &[Arc<RegisteredProvider>],
        message: &str,
        system: Option<&str>,
        opts: &CallOptions,
        race_id: &str,
    ) -> Result<RouteSuccess> {
        let shared = Arc::new(RaceShared {
            board: Mutex::new(RaceBoard::default()),
            notify: Notify::new(),
            race_id: race_id.to_string(),
            providers: providers.iter().map(|p| p.name().to_string()).collect(),
            started: Instant::now(),
            started_at: Utc::now(),
            total: providers.len(),
            audit: self.audit.clone(),
        });

        let message: Arc<str> = Arc::from(message);
        let system: Option<Arc<str>> = system.map(Arc::from);
        for provider in providers {
            self.registry.consume_rate(provider.name());
            tokio::spawn(run_racer(
                shared.clone(),
                self.registry.clone(),
                provider.clone(),
                message.clone(),
                system.clone(),
                *opts,
                self.config.provider_call_timeout(),
            ));
        }

        let ceiling = tokio::time::sleep(self.config.race_ceiling());
        tokio::pin!(ceiling);
        loop {
            // Register for the wakeup before inspecting the board, so a racer
            // settling in between cannot slip past unnoticed.
            let notified = shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut board = shared.board.lock();
                if let Some(winner) = board.winner.take() {
                    return Ok(winner);
                }
                if board.settled == shared.total {
                    return Err(GatewayError::AllProvidersFailed {
                        errors: failure_summaries(&board),
                    });
                }
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = &mut ceiling => {
                    warn!(race_id = %race_id, "race ceiling fired before any provider responded");
                    let board = shared.board.lock();
                    return Err(GatewayError::AllProvidersFailed {
                        errors: failure_summaries(&board),
                    });
                }
            }
        }
    }
}

fn failure_summaries(board: &RaceBoard) -> Vec<String> {
    board
        .errors
        .iter()
        .filter_map(|e| {
            e.error
                .as_ref()
                .map(|msg| format!("{}: {msg}", e.source))
        })
        .collect()
}

/// One provider's leg of a race. Runs detached; the caller may be long gone
/// by the time this settles.
async fn run_racer(
    shared: Arc<RaceShared>,
    registry: Arc<ProviderRegistry>,
    provider: Arc<RegisteredProvider>,
    message: Arc<str>,
    system: Option<Arc<str>>,
    opts: CallOptions,
    timeout: Option<Duration>,
) {
    let start = Instant::now();
    let result = guarded_chat(&provider, &message, system.as_deref(), &opts, timeout).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(completion) => {
            registry.record_success(provider.name(), latency_ms);
            let mut outcome = RaceOutcome {
                source: provider.name().to_string(),
                engine: Some(provider.service_group.clone()),
                status: CallStatus::Ok,
                latency_ms,
                response_length: completion.response.len(),
                model: completion.model.clone(),
                late: false,
                delta_ms: None,
                error: None,
            };

            let mut board = shared.board.lock();
            if !board.responded && !completion.response.trim().is_empty() {
                board.responded = true;
                board.winner_outcome = Some(outcome.clone());
                board.winner = Some(RouteSuccess {
                    response: completion.response,
                    engine: provider.service_group.clone(),
                    model: completion.model,
                    provider: provider.clone(),
                });
            } else {
                outcome.late = true;
                if let Some(winner) = &board.winner_outcome {
                    let winner_latency_ms = winner.latency_ms;
                    let winner_response_length = winner.response_length;
                    outcome.delta_ms = Some(latency_ms.saturating_sub(winner_latency_ms));
                    if outcome.response_length as f64 >= winner_response_length as f64 * 1.5 {
                        board.signals.push(OptimizationSignal {
                            kind: SignalKind::LateButRicher,
                            provider: Some(provider.name().to_string()),
                            recommendation: format!(
                                "{} produced richer content (+{} chars) after the winner. May be worth waiting for.",
                                provider.name(),
                                outcome.response_length.saturating_sub(winner_response_length),
                            ),
                        });
                    }
                }
                board.late_responses.push(outcome.clone());
            }
            board.results.push(outcome);
            settle(&shared, board);
        }
        Err(err) => {
            registry.record_failure(provider.name());
            let outcome = RaceOutcome {
                source: provider.name().to_string(),
                engine: Some(provider.service_group.clone()),
                status: CallStatus::Error,
                latency_ms,
                response_length: 0,
                model: None,
                late: false,
                delta_ms: None,
                error: Some(err.to_string()),
            };
            let mut board = shared.board.lock();
            board.errors.push(outcome.clone());
            board.results.push(outcome);
            settle(&shared, board);
        }
    }

    shared.notify.notify_waiters();
}

/// Count a settled racer; the last one publishes the audit entry
fn settle(shared: &RaceShared, mut board: parking_lot::MutexGuard<'_, RaceBoard>) {
    board.settled += 1;
    if board.settled < shared.total {
        return;
    }
    let entry = RaceAudit {
        race_id: shared.race_id.clone(),
        started_at: shared.started_at,
        providers: shared.providers.clone(),
        winner: board.winner_outcome.clone(),
        results: board.results.clone(),
        late_responses: board.late_responses.clone(),
        errors: board.errors.clone(),
        signals: board.signals.clone(),
        total_latency_ms: shared.started.elapsed().as_millis() as u64,
    };
    drop(board);
    shared.audit.append(AuditEntry::Race(entry));
}
