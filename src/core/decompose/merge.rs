//! Merge strategies for decomposition results

use super::CompletedSubtask;
use crate::core::gateway::{Gateway, guarded_chat};
use crate::core::providers::CallOptions;
use crate::core::registry::RegisteredProvider;
use std::sync::Arc;
use tracing::debug;

/// Each subtask's response is clipped to this many characters inside the
/// synthesize prompt
const SYNTHESIZE_CLIP: usize = 1_500;

/// Join every subtask's heading and body in original order
pub(crate) fn concat(completed: &[CompletedSubtask]) -> String {
    completed
        .iter()
        .map(|c| format!("## {}\n{}", c.def.task, c.response))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Keep the single longest successful response verbatim
pub(crate) fn best(completed: &[CompletedSubtask]) -> String {
    completed
        .iter()
        .max_by_key(|c| c.response.len())
        .map(|c| c.response.clone())
        .unwrap_or_default()
}

/// Ask a provider to merge all subtask outputs into one cohesive response;
/// any failure falls back to [`concat`]
pub(crate) async fn synthesize(
    gateway: &Gateway,
    task: &str,
    completed: &[CompletedSubtask],
    merger: &Arc<RegisteredProvider>,
) -> String {
    let mut prompt = vec![
        format!(
            "You are merging outputs from {} parallel agents that each handled a subtask of a larger task.",
            completed.len()
        ),
        "Synthesize them into ONE cohesive, high-quality response. Remove redundancy, keep the best parts.".to_string(),
        String::new(),
        format!("ORIGINAL TASK: {task}"),
        String::new(),
    ];
    for subtask in completed {
        let clipped: String = subtask.response.chars().take(SYNTHESIZE_CLIP).collect();
        prompt.push(format!("--- SUBTASK: {} ---\n{clipped}\n", subtask.def.task));
    }
    prompt.push(String::new());
    prompt.push("SYNTHESIZED RESPONSE:".to_string());

    let opts = CallOptions {
        temperature: Some(0.3),
        max_tokens: Some(4_096),
    };
    match guarded_chat(
        merger,
        &prompt.join("\n"),
        None,
        &opts,
        gateway.config.provider_call_timeout(),
    )
    .await
    {
        Ok(completion) => completion.response,
        Err(err) => {
            debug!(error = %err, "synthesize merge failed, falling back to concat");
            concat(completed)
        }
    }
}
