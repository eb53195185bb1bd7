//! Terminal metrics node
//!
//! Emits request-level counters. Recording is fire-and-forget; a sink
//! that drops values never affects the answer already on state.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};

pub struct MetricsNode;

#[async_trait]
impl PipelineNode for MetricsNode {
    fn id(&self) -> NodeId {
        NodeId::Metrics
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(replans = state.replan_count, retries = state.retry_count, "MetricsNode::run: called");

        ctx.metrics.record("pipeline.requests", 1.0, &[("domain", &state.domain)]);
        if state.replan_count > 0 {
            ctx.metrics.record("pipeline.replans", state.replan_count as f64, &[]);
        }
        if state.retry_count > 0 {
            ctx.metrics.record("pipeline.retries", state.retry_count as f64, &[]);
        }
        if state.rag_unavailable {
            ctx.metrics.record("pipeline.rag_unavailable", 1.0, &[("domain", &state.domain)]);
        }

        Ok(StatePatch::default())
    }
}
