//! Tool trait definition

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::ToolContext;
use super::error::ToolError;

/// A tool the planner can schedule
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches plan step tool_name)
    fn name(&self) -> &'static str;

    /// Human-readable description, shown to the planner model
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Per-tool timeout override; None uses the executor default
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError>;
}

/// Planner-facing description of a registered tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
        }
    }
}
