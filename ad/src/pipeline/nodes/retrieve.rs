//! Retrieval node for rag_only plans
//!
//! Calls the retriever directly with the user query; mixed plans reach
//! retrieval through the knowledge_search tool instead.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct RetrievalNode;

#[async_trait]
impl PipelineNode for RetrievalNode {
    fn id(&self) -> NodeId {
        NodeId::Retrieval
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(domain = %state.domain, "RetrievalNode::run: called");
        let citations = ctx.retriever.retrieve(&state.domain, &state.query, ctx.top_k).await;

        let none_found = state.citations.is_empty() && citations.is_empty();
        if none_found {
            warn!(domain = %state.domain, "run: retrieval yielded no citations");
        }

        Ok(StatePatch {
            citations,
            rag_unavailable: Some(none_found),
            ..Default::default()
        })
    }
}
