//! Pure routing functions over request state
//!
//! Routing never mutates state; counters are incremented by the nodes
//! that own them before these functions run.

use tracing::debug;

use crate::domain::{NextAction, RequestState};

/// Where a fresh plan routes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRoute {
    RagOnly,
    ToolsOnly,
    RagAndTools,
}

/// Classify the plan by its mix of retrieval and non-retrieval steps
pub fn route_after_plan(state: &RequestState) -> PlanRoute {
    let plan = &state.execution_plan;
    let route = if plan.is_retrieval_only() {
        PlanRoute::RagOnly
    } else if plan.has_no_retrieval() {
        PlanRoute::ToolsOnly
    } else {
        PlanRoute::RagAndTools
    };
    debug!(?route, steps = plan.len(), "route_after_plan");
    route
}

/// Where an observation routes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationRoute {
    Replan,
    Generate,
}

/// Replan only while the observation asks for it and the budget remains
pub fn route_after_observation(state: &RequestState, max_replans: u32) -> ObservationRoute {
    let wants_replan = state
        .observation
        .as_ref()
        .is_some_and(|o| o.next_action == NextAction::Replan);

    let route = if wants_replan && state.replan_count < max_replans {
        ObservationRoute::Replan
    } else {
        ObservationRoute::Generate
    };
    debug!(?route, wants_replan, replan_count = state.replan_count, "route_after_observation");
    route
}

/// Where the guardrail routes next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardrailRoute {
    Retry,
    Continue,
}

/// Retry only when the guardrail requested regeneration
pub fn route_after_guardrail(state: &RequestState) -> GuardrailRoute {
    let route = if state.regeneration_requested {
        GuardrailRoute::Retry
    } else {
        GuardrailRoute::Continue
    };
    debug!(?route, retry_count = state.retry_count, "route_after_guardrail");
    route
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExecutionPlan, Observation};

    fn state_with_plan(plan: ExecutionPlan) -> RequestState {
        let mut state = RequestState::new("q", "s", "u");
        state.execution_plan = plan;
        state
    }

    #[test]
    fn test_retrieval_only_routes_rag() {
        let state = state_with_plan(ExecutionPlan::single_retrieval("q"));
        assert_eq!(route_after_plan(&state), PlanRoute::RagOnly);
    }

    #[test]
    fn test_empty_plan_routes_tools_only() {
        // Empty plans never occur after the planner's fallback, but the
        // routing stays total
        let state = state_with_plan(ExecutionPlan::default());
        assert_eq!(route_after_plan(&state), PlanRoute::ToolsOnly);
    }

    #[test]
    fn test_observation_routes_replan_within_budget() {
        let mut state = RequestState::new("q", "s", "u");
        state.observation = Some(Observation {
            sufficient: false,
            next_action: crate::domain::NextAction::Replan,
            gaps: vec![],
        });

        state.replan_count = 0;
        assert_eq!(route_after_observation(&state, 2), ObservationRoute::Replan);

        state.replan_count = 2;
        assert_eq!(route_after_observation(&state, 2), ObservationRoute::Generate);
    }

    #[test]
    fn test_observation_routes_generate_when_sufficient() {
        let mut state = RequestState::new("q", "s", "u");
        state.observation = Some(Observation::sufficient());
        assert_eq!(route_after_observation(&state, 2), ObservationRoute::Generate);
    }

    #[test]
    fn test_guardrail_routes_on_flag() {
        let mut state = RequestState::new("q", "s", "u");
        assert_eq!(route_after_guardrail(&state), GuardrailRoute::Continue);

        state.regeneration_requested = true;
        assert_eq!(route_after_guardrail(&state), GuardrailRoute::Retry);
    }
}
