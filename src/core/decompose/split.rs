//! Subtask planning: JSON extraction and the fallback split chain
//!
//! The decomposer provider is asked for a JSON array, but its output is
//! model text and treated as hostile: we take the first bracketed array we
//! can find, tolerate junk elements, and when nothing usable comes back we
//! split the task text ourselves — sentence fragments first, three generic
//! aspect subtasks as the last resort.

use super::SubtaskDef;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").expect("static regex"));
static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.;]\s+").expect("static regex"));

/// Fragments shorter than this are noise, not subtasks
const MIN_FRAGMENT_LEN: usize = 10;

/// The prompt sent to the decomposer provider
pub(crate) fn decomposition_prompt(task: &str, max: usize) -> String {
    [
        format!(
            "You are a task decomposition engine. Split this complex task into {max} independent subtasks."
        ),
        "Each subtask should be self-contained and parallelizable.".to_string(),
        "Return ONLY a JSON array of objects: [{ \"id\": 1, \"task\": \"subtask description\", \"skill\": \"reasoning|code|creative|analysis\" }]".to_string(),
        "No explanation, just the JSON array.".to_string(),
        String::new(),
        format!("TASK: {task}"),
    ]
    .join("\n")
}

/// Parse the first bracketed JSON array out of a decomposer response.
///
/// Returns `None` when no array parses or it parses empty; the caller then
/// falls back to [`fallback_split`]. Non-object elements degrade to
/// positionally-named subtasks instead of failing the whole parse.
pub(crate) fn parse_subtasks(raw: &str, max: usize) -> Option<Vec<SubtaskDef>> {
    let found = ARRAY_RE.find(raw)?;
    let parsed: Vec<Value> = serde_json::from_str(found.as_str()).ok()?;
    if parsed.is_empty() {
        return None;
    }
    Some(
        parsed
            .into_iter()
            .take(max)
            .enumerate()
            .map(|(i, value)| SubtaskDef {
                id: value
                    .get("id")
                    .and_then(Value::as_u64)
                    .map(|id| id as u32)
                    .unwrap_or(i as u32 + 1),
                task: value
                    .get("task")
                    .or_else(|| value.get("description"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Subtask {}", i + 1)),
                skill: value
                    .get("skill")
                    .and_then(Value::as_str)
                    .unwrap_or("general")
                    .to_string(),
            })
            .collect(),
    )
}

/// Deterministic split used when the decomposer fails: sentence fragments
/// when the task has at least two, otherwise three generic aspect subtasks.
pub(crate) fn fallback_split(task: &str, max: usize) -> Vec<SubtaskDef> {
    let fragments: Vec<&str> = SENTENCE_RE
        .split(task)
        .filter(|s| s.len() > MIN_FRAGMENT_LEN)
        .collect();
    if fragments.len() >= 2 {
        return fragments
            .into_iter()
            .take(max)
            .enumerate()
            .map(|(i, fragment)| SubtaskDef {
                id: i as u32 + 1,
                task: fragment.trim().to_string(),
                skill: "general".to_string(),
            })
            .collect();
    }

    [
        ("Analyze and plan", "analysis"),
        ("Implement the core logic", "code"),
        ("Review, optimize, and document", "reasoning"),
    ]
    .iter()
    .take(max)
    .enumerate()
    .map(|(i, (stem, skill))| SubtaskDef {
        id: i as u32 + 1,
        task: format!("{stem}: {task}"),
        skill: (*skill).to_string(),
    })
    .collect()
}
