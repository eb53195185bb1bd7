//! Tool execution node
//!
//! Runs the whole plan through the plan runner; knowledge_search steps
//! carry retrieval for mixed plans, and their citations are lifted into
//! state here.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};
use crate::tools::citations_from_results;

pub struct ToolsNode;

#[async_trait]
impl PipelineNode for ToolsNode {
    fn id(&self) -> NodeId {
        NodeId::Tools
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(steps = state.execution_plan.len(), "ToolsNode::run: called");

        let tool_ctx = ctx.tool_ctx(state);
        let results = ctx.runner.run_plan(&state.execution_plan, &tool_ctx).await;
        ctx.metrics.record("pipeline.tool_calls", results.len() as f64, &[]);

        let failed = results.iter().filter(|r| !r.is_success()).count();
        if failed > 0 {
            warn!(failed, total = results.len(), "run: some steps did not succeed");
        }

        let citations = citations_from_results(&results);
        let attempted_retrieval = state
            .execution_plan
            .steps
            .iter()
            .any(|s| s.tool_name == crate::tools::KNOWLEDGE_SEARCH);
        let rag_unavailable = attempted_retrieval
            .then(|| state.citations.is_empty() && citations.is_empty());

        Ok(StatePatch {
            tool_results: results,
            citations,
            rag_unavailable,
            ..Default::default()
        })
    }
}
