//! Intent classification node
//!
//! Keyword heuristics first; the model is only consulted when no domain
//! keyword matches. Any failure lands in the default domain.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::llm::CompletionRequest;
use crate::parser;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct IntentNode;

#[derive(Debug, Deserialize)]
struct IntentChoice {
    domain: String,
}

/// Keyword classification: domain with the most keyword hits wins,
/// ties broken alphabetically
fn classify_by_keywords(ctx: &NodeContext, query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    let mut best: Option<(usize, &str)> = None;

    for policy in ctx.policies.iter() {
        let hits = policy.keywords.iter().filter(|k| lowered.contains(*k)).count();
        if hits > 0 && best.is_none_or(|(best_hits, _)| hits > best_hits) {
            best = Some((hits, &policy.name));
        }
    }

    best.map(|(_, name)| name.to_string())
}

#[async_trait]
impl PipelineNode for IntentNode {
    fn id(&self) -> NodeId {
        NodeId::Intent
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(query = %state.query, "IntentNode::run: called");

        // A caller-supplied hint skips classification entirely
        if !state.domain.is_empty() && ctx.policies.domains().contains(&state.domain.as_str()) {
            debug!(domain = %state.domain, "run: keeping caller-supplied domain");
            return Ok(StatePatch::default());
        }

        if let Some(domain) = classify_by_keywords(ctx, &state.query) {
            debug!(%domain, "run: keyword match");
            return Ok(StatePatch {
                domain: Some(domain),
                ..Default::default()
            });
        }

        // No keyword hit; ask the model
        let domain = match self.classify_by_llm(state, ctx).await {
            Some(domain) => domain,
            None => {
                warn!("run: classification failed, using default domain");
                ctx.policies.default_domain().to_string()
            }
        };

        Ok(StatePatch {
            domain: Some(domain),
            ..Default::default()
        })
    }
}

impl IntentNode {
    async fn classify_by_llm(&self, state: &RequestState, ctx: &NodeContext) -> Option<String> {
        let prompt = ctx
            .prompts
            .render(
                "intent",
                &json!({
                    "query": state.query,
                    "domains": ctx.policies.domains(),
                }),
            )
            .ok()?;

        let response = ctx.complete(CompletionRequest::prompt(prompt, &state.query, 128)).await.ok()?;
        let choice: IntentChoice = parser::parse_json(&response.content.unwrap_or_default()).ok()?;

        let domain = choice.domain.trim().to_lowercase();
        if ctx.policies.domains().contains(&domain.as_str()) {
            Some(domain)
        } else {
            warn!(%domain, "classify_by_llm: model produced unknown domain");
            None
        }
    }
}
