//! Memory reducer node
//!
//! Folds the finished turn into conversation memory. Runs after the
//! answer is final so a regenerated answer is remembered, not its
//! rejected drafts.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{Message, RequestState, StatePatch};
use crate::error::PipelineError;
use crate::memory;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct MemoryNode;

#[async_trait]
impl PipelineNode for MemoryNode {
    fn id(&self) -> NodeId {
        NodeId::Memory
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(window = state.messages.len(), "MemoryNode::run: called");

        let answer_text = state
            .answer
            .as_ref()
            .map(|a| a.text())
            .unwrap_or_default();

        let delta = memory::reduce(
            &ctx.llm,
            &ctx.prompts,
            &ctx.config,
            state.messages.clone(),
            &state.memory_summary,
            &state.memory_facts,
            Message::user(&state.query),
            Message::assistant(&answer_text),
        )
        .await;

        Ok(StatePatch {
            messages: Some(delta.messages),
            memory_summary: Some(delta.summary),
            memory_facts: Some(delta.facts),
            ..Default::default()
        })
    }
}
