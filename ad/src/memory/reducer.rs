//! Conversational memory reducer
//!
//! Runs at turn end: appends the new turn, dedupes and truncates the
//! rolling window, and merges summary/facts through the model. Every
//! model-dependent step is best effort; failure keeps the prior memory.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::domain::Message;
use crate::llm::{CompletionRequest, LlmClient};
use crate::parser;
use crate::prompts::PromptSet;

/// Reduced memory for one session after a turn
#[derive(Debug, Clone)]
pub struct MemoryDelta {
    pub messages: Vec<Message>,
    pub summary: String,
    pub facts: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MemoryMerge {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    facts: Vec<String>,
}

/// Drop duplicate messages by fingerprint (newest occurrence wins) and
/// keep the last `window` entries
pub fn dedupe_and_truncate(messages: Vec<Message>, window: usize) -> Vec<Message> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut kept: Vec<Message> = Vec::new();

    for msg in messages.into_iter().rev() {
        if seen.insert(msg.fingerprint()) {
            kept.push(msg);
        }
    }
    kept.reverse();

    if kept.len() > window {
        kept.drain(..kept.len() - window);
    }
    kept
}

/// Normalized conflict key for a fact: text before the first ':', or the
/// first three tokens when there is no ':'
fn fact_subject(fact: &str) -> String {
    let normalized = fact.trim().to_lowercase();
    match normalized.split_once(':') {
        Some((subject, _)) => subject.trim().to_string(),
        None => normalized.split_whitespace().take(3).collect::<Vec<_>>().join(" "),
    }
}

/// Merge new facts into existing ones
///
/// A new fact with an existing subject replaces the old fact in place;
/// otherwise it appends. Oldest facts drop first when over `cap`.
pub fn merge_facts(existing: Vec<String>, new: Vec<String>, cap: usize) -> Vec<String> {
    let mut merged = existing;

    for fact in new {
        let fact = fact.trim().to_string();
        if fact.is_empty() {
            continue;
        }
        let subject = fact_subject(&fact);
        match merged.iter().position(|f| fact_subject(f) == subject) {
            Some(idx) => merged[idx] = fact,
            None => merged.push(fact),
        }
    }

    if merged.len() > cap {
        merged.drain(..merged.len() - cap);
    }
    merged
}

/// Reduce session memory after a completed turn
pub async fn reduce(
    llm: &Arc<dyn LlmClient>,
    prompts: &PromptSet,
    config: &PipelineConfig,
    prior_messages: Vec<Message>,
    prior_summary: &str,
    prior_facts: &[String],
    user_turn: Message,
    assistant_turn: Message,
) -> MemoryDelta {
    debug!(prior = prior_messages.len(), "reduce: called");

    let mut messages = prior_messages;
    messages.push(user_turn);
    messages.push(assistant_turn);
    let full_len = messages.len();
    let messages = dedupe_and_truncate(messages, config.message_window);

    // Merge through the model when the window fills or no summary exists yet
    let needs_merge = full_len >= config.message_window || prior_summary.is_empty();
    if !needs_merge {
        return MemoryDelta {
            messages,
            summary: prior_summary.to_string(),
            facts: prior_facts.to_vec(),
        };
    }

    let prompt = match prompts.render(
        "memory",
        &json!({
            "summary": prior_summary,
            "facts": prior_facts,
            "messages": messages,
        }),
    ) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "reduce: prompt render failed, keeping prior memory");
            return MemoryDelta {
                messages,
                summary: prior_summary.to_string(),
                facts: prior_facts.to_vec(),
            };
        }
    };

    let request = CompletionRequest::prompt(prompt, "Merge the memory now.", 1024);
    let merge = match llm.complete(request).await {
        Ok(response) => {
            let content = response.content.unwrap_or_default();
            match parser::parse_json::<MemoryMerge>(&content) {
                Ok(merge) => merge,
                Err(e) => {
                    warn!(error = %e, "reduce: merge output unparseable, keeping prior memory");
                    return MemoryDelta {
                        messages,
                        summary: prior_summary.to_string(),
                        facts: prior_facts.to_vec(),
                    };
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "reduce: merge call failed, keeping prior memory");
            return MemoryDelta {
                messages,
                summary: prior_summary.to_string(),
                facts: prior_facts.to_vec(),
            };
        }
    };

    let summary = if merge.summary.trim().is_empty() {
        prior_summary.to_string()
    } else {
        merge.summary.trim().to_string()
    };
    let facts = merge_facts(prior_facts.to_vec(), merge.facts, config.max_facts);

    MemoryDelta { messages, summary, facts }
}
