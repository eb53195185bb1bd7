//! Core value types shared across pipeline nodes

pub mod message;
pub mod plan;
pub mod state;

pub use message::{Message, Role};
pub use plan::{ExecutionPlan, MAX_PLAN_STEPS, OutlineStep, PlanOutline, PlanStep};
pub use state::{
    Answer, Citation, MAX_FACTS, MAX_REPLAN, MAX_RETRY, MESSAGE_WINDOW, NextAction, Observation, RequestState,
    StatePatch, ToolResult, ToolStatus,
};
