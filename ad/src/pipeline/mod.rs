pub mod context;
pub mod graph;
pub mod nodes;
pub mod routes;

pub use context::NodeContext;
pub use graph::{GraphExecutor, NodeId, PipelineNode};
pub use routes::{
    route_after_guardrail, route_after_observation, route_after_plan, GuardrailRoute, ObservationRoute, PlanRoute,
};
