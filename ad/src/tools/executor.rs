//! Tool registry and dependency-ordered plan execution

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::json;
use tracing::{debug, warn};

use super::builtin;
use super::context::ToolContext;
use super::traits::{Tool, ToolDefinition};
use crate::config::ToolsConfig;
use crate::domain::{Citation, ExecutionPlan, PlanStep, ToolResult, ToolStatus};

/// Registry of available tools by name
pub struct ToolCatalog {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Catalog with the builtin tool set
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog.register(Box::new(builtin::KnowledgeSearchTool));
        catalog.register(Box::new(builtin::TicketDraftTool));
        catalog.register(Box::new(builtin::CalculatorTool));
        catalog
    }

    /// Register a tool, replacing any existing tool of the same name
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        debug!(name = %tool.name(), "ToolCatalog::register: called");
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Planner-facing definitions, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| ToolDefinition::from_tool(t.as_ref())).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Compact text listing for prompt templates
    pub fn catalog_text(&self) -> String {
        self.definitions()
            .iter()
            .map(|d| format!("- {}: {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Executes sanitized plans against a catalog
///
/// Steps run sequentially in dependency order. Each step gets a timeout
/// (tool override or configured default) and a bounded retry budget with
/// exponential backoff plus jitter. A failing or timing-out step is
/// recorded and the batch continues.
pub struct PlanRunner {
    catalog: ToolCatalog,
    default_timeout: Duration,
    retries: u32,
    backoff: Duration,
}

impl PlanRunner {
    pub fn new(catalog: ToolCatalog, config: &ToolsConfig) -> Self {
        Self {
            catalog,
            default_timeout: Duration::from_millis(config.timeout_ms),
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Run every step of the plan; one result per step, in execution order
    pub async fn run_plan(&self, plan: &ExecutionPlan, ctx: &ToolContext) -> Vec<ToolResult> {
        debug!(steps = plan.len(), "PlanRunner::run_plan: called");
        let mut results = Vec::with_capacity(plan.len());

        for index in plan.execution_order() {
            let step = &plan.steps[index];
            results.push(self.run_step(step, ctx).await);
        }

        results
    }

    async fn run_step(&self, step: &PlanStep, ctx: &ToolContext) -> ToolResult {
        debug!(id = step.id, tool = %step.tool_name, "PlanRunner::run_step: called");
        let started = Instant::now();

        let Some(tool) = self.catalog.get(&step.tool_name) else {
            warn!(tool = %step.tool_name, "run_step: unknown tool");
            return ToolResult {
                tool_name: step.tool_name.clone(),
                status: ToolStatus::Error,
                payload: json!({ "error": format!("Unknown tool: {}", step.tool_name) }),
                latency_ms: started.elapsed().as_millis() as u64,
            };
        };

        let timeout = tool.timeout().unwrap_or(self.default_timeout);
        let mut last_status = ToolStatus::Error;
        let mut last_payload = json!({ "error": "not executed" });

        for attempt in 0..=self.retries {
            if attempt > 0 {
                let backoff = self.backoff.as_millis() as u64 * 2u64.pow(attempt - 1);
                let jitter = rand::rng().random_range(0..=self.backoff.as_millis() as u64 / 2);
                warn!(tool = %step.tool_name, attempt, backoff_ms = backoff + jitter, "run_step: retrying");
                tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
            }

            match tokio::time::timeout(timeout, tool.execute(step.arguments.clone(), ctx)).await {
                Ok(Ok(payload)) => {
                    debug!(tool = %step.tool_name, attempt, "run_step: success");
                    return ToolResult {
                        tool_name: step.tool_name.clone(),
                        status: ToolStatus::Success,
                        payload,
                        latency_ms: started.elapsed().as_millis() as u64,
                    };
                }
                Ok(Err(e)) => {
                    debug!(tool = %step.tool_name, attempt, error = %e, "run_step: tool error");
                    last_status = ToolStatus::Error;
                    last_payload = json!({ "error": e.to_string() });
                }
                Err(_) => {
                    debug!(tool = %step.tool_name, attempt, timeout_ms = timeout.as_millis() as u64, "run_step: timed out");
                    last_status = ToolStatus::Timeout;
                    last_payload = json!({ "error": format!("timed out after {}ms", timeout.as_millis()) });
                }
            }
        }

        warn!(tool = %step.tool_name, status = last_status.as_str(), "run_step: exhausted attempts");
        ToolResult {
            tool_name: step.tool_name.clone(),
            status: last_status,
            payload: last_payload,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Lift citations out of successful knowledge_search payloads
pub fn citations_from_results(results: &[ToolResult]) -> Vec<Citation> {
    results
        .iter()
        .filter(|r| r.tool_name == super::KNOWLEDGE_SEARCH && r.is_success())
        .filter_map(|r| r.payload.get("citations"))
        .filter_map(|v| serde_json::from_value::<Vec<Citation>>(v.clone()).ok())
        .flatten()
        .collect()
}
