//! Graph executor
//!
//! Fixed topology with three conditional edges. Every node returns a
//! patch; the executor is the only place state is mutated, so a node
//! can never observe a half-applied step.

use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::nodes::{
    GenerateNode, GuardrailNode, HookNode, IntentNode, MemoryNode, MetricsNode, ObserveNode, PlanNode, RetrievalNode,
    ToolsNode,
};
use crate::pipeline::routes::{
    route_after_guardrail, route_after_observation, route_after_plan, GuardrailRoute, ObservationRoute, PlanRoute,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Intent,
    Plan,
    Retrieval,
    Tools,
    Observe,
    Generate,
    Guardrail,
    Hook,
    Memory,
    Metrics,
    End,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Intent => "intent",
            NodeId::Plan => "plan",
            NodeId::Retrieval => "retrieval",
            NodeId::Tools => "tools",
            NodeId::Observe => "observe",
            NodeId::Generate => "generate",
            NodeId::Guardrail => "guardrail",
            NodeId::Hook => "hook",
            NodeId::Memory => "memory",
            NodeId::Metrics => "metrics",
            NodeId::End => "end",
        }
    }
}

/// A single step of the pipeline
#[async_trait]
pub trait PipelineNode: Send + Sync {
    fn id(&self) -> NodeId;

    /// Compute a patch from the current state; must not mutate anything
    /// outside its own collaborators
    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError>;
}

pub struct GraphExecutor {
    ctx: NodeContext,
    nodes: Vec<Box<dyn PipelineNode>>,
}

impl GraphExecutor {
    pub fn new(ctx: NodeContext) -> Self {
        let nodes: Vec<Box<dyn PipelineNode>> = vec![
            Box::new(IntentNode),
            Box::new(PlanNode),
            Box::new(RetrievalNode),
            Box::new(ToolsNode),
            Box::new(ObserveNode),
            Box::new(GenerateNode),
            Box::new(GuardrailNode),
            Box::new(HookNode),
            Box::new(MemoryNode),
            Box::new(MetricsNode),
        ];
        Self { ctx, nodes }
    }

    pub fn context(&self) -> &NodeContext {
        &self.ctx
    }

    /// Drive the state from intent to the terminal node
    pub async fn run(&self, mut state: RequestState) -> Result<RequestState, PipelineError> {
        debug!(session = %state.session_id, "GraphExecutor::run: called");
        let mut current = NodeId::Intent;

        while current != NodeId::End {
            let node = self.node(current);
            let start = Instant::now();
            let patch = node.run(&state, &self.ctx).await?;
            patch.apply(&mut state);
            self.ctx.metrics.record(
                "node.latency_ms",
                start.elapsed().as_millis() as f64,
                &[("node", current.as_str())],
            );
            current = self.next_node(current, &state);
        }

        Ok(state)
    }

    fn node(&self, id: NodeId) -> &dyn PipelineNode {
        self.nodes
            .iter()
            .find(|n| n.id() == id)
            .map(|n| n.as_ref())
            .unwrap_or_else(|| unreachable!("node {} not registered", id.as_str()))
    }

    fn next_node(&self, from: NodeId, state: &RequestState) -> NodeId {
        match from {
            NodeId::Intent => NodeId::Plan,
            NodeId::Plan => match route_after_plan(state) {
                PlanRoute::RagOnly => NodeId::Retrieval,
                PlanRoute::ToolsOnly | PlanRoute::RagAndTools => NodeId::Tools,
            },
            NodeId::Retrieval | NodeId::Tools => NodeId::Observe,
            NodeId::Observe => match route_after_observation(state, self.ctx.config.max_replans) {
                ObservationRoute::Replan => NodeId::Plan,
                ObservationRoute::Generate => NodeId::Generate,
            },
            NodeId::Generate => NodeId::Guardrail,
            NodeId::Guardrail => match route_after_guardrail(state) {
                GuardrailRoute::Retry => NodeId::Generate,
                GuardrailRoute::Continue => NodeId::Hook,
            },
            NodeId::Hook => NodeId::Memory,
            NodeId::Memory => NodeId::Metrics,
            NodeId::Metrics | NodeId::End => NodeId::End,
        }
    }
}
