//! Sequential dispatch
//!
//! Providers are tried strictly in priority order; the first success wins
//! and a failure just moves on to the next candidate. Used when the caller
//! opts out of racing or when only one provider survived the availability
//! filter.

use super::types::RouteSuccess;
use super::{Gateway, guarded_chat};
use crate::core::providers::CallOptions;
use crate::core::registry::RegisteredProvider;
use crate::utils::error::{GatewayError, Result};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

impl Gateway {
    pub(crate) async fn route_sequential(
        &self,
        providers: &[Arc<RegisteredProvider>],
        message: &str,
        system: Option<&str>,
        opts: &CallOptions,
    ) -> Result<RouteSuccess> {
        let mut errors = Vec::new();
        for provider in providers {
            self.registry.consume_rate(provider.name());
            let start = Instant::now();
            match guarded_chat(
                provider,
                message,
                system,
                opts,
                self.config.provider_call_timeout(),
            )
            .await
            {
                Ok(completion) => {
                    self.registry
                        .record_success(provider.name(), start.elapsed().as_millis() as u64);
                    return Ok(RouteSuccess {
                        response: completion.response,
                        engine: provider.service_group.clone(),
                        model: completion.model,
                        provider: provider.clone(),
                    });
                }
                Err(err) => {
                    debug!(provider = %provider.name(), error = %err, "sequential attempt failed");
                    self.registry.record_failure(provider.name());
                    errors.push(format!("{}: {err}", provider.name()));
                }
            }
        }
        Err(GatewayError::AllProvidersFailed { errors })
    }
}
