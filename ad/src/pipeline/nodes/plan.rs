//! Planner node
//!
//! Asks the model for a bounded tool plan and sanitizes it. Any failure
//! degrades to a single knowledge_search step. Owns replan_count: the
//! counter increments on every re-entry from the observation loop.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{ExecutionPlan, PlanOutline, RequestState, StatePatch};
use crate::error::PipelineError;
use crate::llm::CompletionRequest;
use crate::parser;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct PlanNode;

#[async_trait]
impl PipelineNode for PlanNode {
    fn id(&self) -> NodeId {
        NodeId::Plan
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        // An observation on state means the loop sent us back here
        let reentry = state.observation.is_some();
        let replan_count = if reentry { Some(state.replan_count + 1) } else { None };
        debug!(reentry, replan_count = state.replan_count, "PlanNode::run: called");

        let gaps: Vec<String> = state
            .observation
            .as_ref()
            .map(|o| o.gaps.clone())
            .unwrap_or_default();

        let plan = match self.plan_by_llm(state, ctx, &gaps).await {
            Some(plan) if !plan.is_empty() => plan,
            _ => {
                warn!("run: planning failed, falling back to single retrieval step");
                ExecutionPlan::single_retrieval(&state.query)
            }
        };

        debug!(steps = plan.len(), "run: plan ready");
        Ok(StatePatch {
            execution_plan: Some(plan),
            replan_count,
            ..Default::default()
        })
    }
}

impl PlanNode {
    async fn plan_by_llm(&self, state: &RequestState, ctx: &NodeContext, gaps: &[String]) -> Option<ExecutionPlan> {
        let prompt = ctx
            .prompts
            .render(
                "plan",
                &json!({
                    "domain": state.domain,
                    "query": state.query,
                    "tools": ctx.runner.catalog().catalog_text(),
                    "max_steps": ctx.config.max_plan_steps,
                    "gaps": gaps,
                }),
            )
            .ok()?;

        let response = ctx.complete(CompletionRequest::prompt(prompt, &state.query, 1024)).await.ok()?;
        let outline: PlanOutline = parser::parse_json(&response.content.unwrap_or_default()).ok()?;

        let mut plan = ExecutionPlan::from_outline(outline);
        plan.steps.retain(|step| {
            let known = ctx.runner.catalog().contains(&step.tool_name);
            if !known {
                warn!(tool = %step.tool_name, "plan_by_llm: dropping step with unknown tool");
            }
            known
        });
        Some(plan)
    }
}
