//! Execution plans produced by the planner node

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum number of steps a plan may carry
pub const MAX_PLAN_STEPS: usize = 5;

/// One planned tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: u32,
    pub tool_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
    #[serde(default)]
    pub depends_on: Vec<u32>,
}

/// Raw plan shape as emitted by the model, before sanitization
#[derive(Debug, Clone, Deserialize)]
pub struct PlanOutline {
    #[serde(default)]
    pub steps: Vec<OutlineStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlineStep {
    pub id: u32,
    #[serde(alias = "tool_name")]
    pub tool: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
    #[serde(default)]
    pub depends_on: Vec<u32>,
}

/// Sanitized, bounded list of tool steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    /// Fallback plan: one retrieval step for the raw query
    pub fn single_retrieval(query: &str) -> Self {
        Self {
            steps: vec![PlanStep {
                id: 1,
                tool_name: crate::tools::KNOWLEDGE_SEARCH.to_string(),
                arguments: serde_json::json!({ "query": query }),
                depends_on: vec![],
            }],
        }
    }

    /// Sanitize a model-produced outline into a valid plan
    ///
    /// Duplicate ids are dropped (first occurrence wins), dependency refs
    /// must point at an earlier id in the plan (forward and self refs are
    /// dropped), and oversize plans are truncated to [`MAX_PLAN_STEPS`].
    pub fn from_outline(outline: PlanOutline) -> Self {
        debug!(raw_steps = outline.steps.len(), "ExecutionPlan::from_outline: called");

        let mut seen_ids: HashSet<u32> = HashSet::new();
        let mut steps = Vec::new();

        for raw in outline.steps {
            if steps.len() >= MAX_PLAN_STEPS {
                warn!(dropped_id = raw.id, "from_outline: plan truncated");
                break;
            }
            if raw.tool.trim().is_empty() {
                warn!(id = raw.id, "from_outline: dropping step with empty tool name");
                continue;
            }
            if !seen_ids.insert(raw.id) {
                warn!(id = raw.id, "from_outline: dropping duplicate step id");
                continue;
            }

            let depends_on: Vec<u32> = raw
                .depends_on
                .into_iter()
                .filter(|dep| {
                    let valid = *dep != raw.id && seen_ids.contains(dep);
                    if !valid {
                        warn!(id = raw.id, dep, "from_outline: dropping invalid dependency ref");
                    }
                    valid
                })
                .collect();

            steps.push(PlanStep {
                id: raw.id,
                tool_name: raw.tool,
                arguments: raw.arguments,
                depends_on,
            });
        }

        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when every step is a retrieval step
    pub fn is_retrieval_only(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.tool_name == crate::tools::KNOWLEDGE_SEARCH)
    }

    /// True when no step is a retrieval step
    pub fn has_no_retrieval(&self) -> bool {
        self.steps.iter().all(|s| s.tool_name != crate::tools::KNOWLEDGE_SEARCH)
    }

    /// Dependency-respecting execution order as indices into `steps`
    ///
    /// Kahn's algorithm with ties broken by step id ascending. Sanitized
    /// plans only carry backward refs, so every step is reachable.
    pub fn execution_order(&self) -> Vec<usize> {
        let n = self.steps.len();
        let mut order = Vec::with_capacity(n);
        let mut done: HashSet<u32> = HashSet::new();
        let mut remaining: Vec<usize> = (0..n).collect();

        while !remaining.is_empty() {
            let mut ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| self.steps[i].depends_on.iter().all(|dep| done.contains(dep)))
                .collect();

            if ready.is_empty() {
                // Unsatisfiable deps (should not survive sanitization);
                // run the stragglers in id order rather than stalling.
                warn!("execution_order: unsatisfiable dependencies, falling back to id order");
                ready = remaining.clone();
            }

            ready.sort_by_key(|&i| self.steps[i].id);
            let next = ready[0];
            done.insert(self.steps[next].id);
            remaining.retain(|&i| i != next);
            order.push(next);
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline_step(id: u32, tool: &str, depends_on: Vec<u32>) -> OutlineStep {
        OutlineStep {
            id,
            tool: tool.to_string(),
            arguments: serde_json::json!({}),
            depends_on,
        }
    }

    #[test]
    fn test_from_outline_truncates_oversize_plans() {
        let outline = PlanOutline {
            steps: (1..=8).map(|i| outline_step(i, "calculator", vec![])).collect(),
        };
        let plan = ExecutionPlan::from_outline(outline);
        assert_eq!(plan.len(), MAX_PLAN_STEPS);
    }

    #[test]
    fn test_from_outline_drops_forward_and_self_refs() {
        let outline = PlanOutline {
            steps: vec![
                outline_step(1, "knowledge_search", vec![]),
                outline_step(2, "ticket_draft", vec![1, 2, 9]),
            ],
        };
        let plan = ExecutionPlan::from_outline(outline);
        assert_eq!(plan.steps[1].depends_on, vec![1]);
    }

    #[test]
    fn test_from_outline_drops_duplicate_ids() {
        let outline = PlanOutline {
            steps: vec![
                outline_step(1, "knowledge_search", vec![]),
                outline_step(1, "calculator", vec![]),
            ],
        };
        let plan = ExecutionPlan::from_outline(outline);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].tool_name, "knowledge_search");
    }

    #[test]
    fn test_execution_order_respects_dependencies() {
        let plan = ExecutionPlan {
            steps: vec![
                PlanStep {
                    id: 3,
                    tool_name: "ticket_draft".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![1, 2],
                },
                PlanStep {
                    id: 1,
                    tool_name: "knowledge_search".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
                PlanStep {
                    id: 2,
                    tool_name: "calculator".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
            ],
        };

        let order = plan.execution_order();
        let ids: Vec<u32> = order.iter().map(|&i| plan.steps[i].id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_execution_order_ties_by_id() {
        let plan = ExecutionPlan {
            steps: vec![
                PlanStep {
                    id: 5,
                    tool_name: "a".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
                PlanStep {
                    id: 2,
                    tool_name: "b".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
            ],
        };
        let ids: Vec<u32> = plan.execution_order().iter().map(|&i| plan.steps[i].id).collect();
        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_single_retrieval_fallback() {
        let plan = ExecutionPlan::single_retrieval("how do I reset my password");
        assert_eq!(plan.len(), 1);
        assert!(plan.is_retrieval_only());
        assert_eq!(plan.steps[0].arguments["query"], "how do I reset my password");
    }

    #[test]
    fn test_retrieval_classification() {
        let mixed = ExecutionPlan {
            steps: vec![
                PlanStep {
                    id: 1,
                    tool_name: "knowledge_search".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
                PlanStep {
                    id: 2,
                    tool_name: "calculator".to_string(),
                    arguments: serde_json::json!({}),
                    depends_on: vec![],
                },
            ],
        };
        assert!(!mixed.is_retrieval_only());
        assert!(!mixed.has_no_retrieval());
    }
}
