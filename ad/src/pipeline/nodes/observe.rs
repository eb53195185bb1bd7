//! Observation evaluator node
//!
//! Judges evidence sufficiency. Deterministic fast path when the domain
//! policy allows it and citations are plentiful; otherwise a model
//! judgment. Failures degrade to sufficient so generation always runs.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{Observation, RequestState, StatePatch};
use crate::error::PipelineError;
use crate::llm::CompletionRequest;
use crate::parser;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct ObserveNode;

#[async_trait]
impl PipelineNode for ObserveNode {
    fn id(&self) -> NodeId {
        NodeId::Observe
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(citations = state.citations.len(), "ObserveNode::run: called");
        let policy = ctx.policies.policy_for(&state.domain);

        // Fast path: enough evidence, no model call needed
        if policy.auto_sufficient && state.citations.len() >= ctx.config.sufficiency_citations {
            debug!("run: auto-sufficient fast path");
            return Ok(StatePatch {
                observation: Some(Observation::sufficient()),
                ..Default::default()
            });
        }

        let observation = match self.judge_by_llm(state, ctx).await {
            Some(observation) => observation,
            None => {
                warn!("run: judgment failed, degrading to sufficient");
                Observation::sufficient()
            }
        };

        Ok(StatePatch {
            observation: Some(observation),
            ..Default::default()
        })
    }
}

impl ObserveNode {
    async fn judge_by_llm(&self, state: &RequestState, ctx: &NodeContext) -> Option<Observation> {
        let prompt = ctx
            .prompts
            .render(
                "observe",
                &json!({
                    "query": state.query,
                    "domain": state.domain,
                    "citation_count": state.citations.len(),
                    "tool_results": state.tool_results,
                }),
            )
            .ok()?;

        let response = ctx.complete(CompletionRequest::prompt(prompt, &state.query, 512)).await.ok()?;
        parser::parse_json(&response.content.unwrap_or_default()).ok()
    }
}
