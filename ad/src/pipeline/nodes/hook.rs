//! Post-answer hook node

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct HookNode;

#[async_trait]
impl PipelineNode for HookNode {
    fn id(&self) -> NodeId {
        NodeId::Hook
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(domain = %state.domain, "HookNode::run: called");

        let Some(answer) = &state.answer else {
            warn!("run: no answer on state, skipping hook");
            return Ok(StatePatch::default());
        };

        let output = ctx
            .hook
            .prepare_draft(&state.domain, &state.query, answer, &state.citations, &state.user_id);

        Ok(StatePatch {
            hook_output: Some(output),
            ..Default::default()
        })
    }
}
