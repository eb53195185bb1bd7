//! Per-request pipeline state and the patches nodes emit
//!
//! Nodes never mutate [`RequestState`] directly. Each node returns a
//! [`StatePatch`]; the graph executor merges patches between steps, so
//! every state transition is visible in one place.

use serde::{Deserialize, Serialize};

use super::message::Message;
use super::plan::ExecutionPlan;

/// Maximum times the observation loop may route back to planning
pub const MAX_REPLAN: u32 = 2;

/// Maximum times the guardrail may route back to generation
pub const MAX_RETRY: u32 = 2;

/// Rolling conversation window length
pub const MESSAGE_WINDOW: usize = 8;

/// Maximum number of persisted memory facts
pub const MAX_FACTS: usize = 8;

/// Outcome status of one executed plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
    Timeout,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::Success => "success",
            ToolStatus::Error => "error",
            ToolStatus::Timeout => "timeout",
        }
    }
}

/// Result of one executed plan step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub status: ToolStatus,
    pub payload: serde_json::Value,
    pub latency_ms: u64,
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

/// A retrieved evidence snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source_id: String,
    pub title: String,
    pub score: f32,
    pub excerpt: String,
}

/// What the observation evaluator wants next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    Generate,
    Replan,
}

/// Evidence-sufficiency judgment after tool/retrieval execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub sufficient: bool,
    pub next_action: NextAction,
    #[serde(default)]
    pub gaps: Vec<String>,
}

impl Observation {
    pub fn sufficient() -> Self {
        Self {
            sufficient: true,
            next_action: NextAction::Generate,
            gaps: vec![],
        }
    }
}

/// Structured final answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub greeting: String,
    pub body: String,
    #[serde(default)]
    pub closing: String,
}

impl Answer {
    pub fn body_only(body: impl Into<String>) -> Self {
        Self {
            greeting: String::new(),
            body: body.into(),
            closing: String::new(),
        }
    }

    /// Render the answer as display text, skipping empty sections
    pub fn text(&self) -> String {
        [self.greeting.as_str(), self.body.as_str(), self.closing.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Full state for one inbound query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestState {
    pub query: String,
    pub domain: String,
    pub session_id: String,
    pub user_id: String,

    /// Rolling window loaded from session memory; rewritten by the
    /// memory reducer at turn end
    pub messages: Vec<Message>,

    pub execution_plan: ExecutionPlan,
    pub tool_results: Vec<ToolResult>,
    pub citations: Vec<Citation>,
    pub observation: Option<Observation>,

    pub replan_count: u32,
    pub retry_count: u32,
    pub validation_errors: Vec<String>,
    /// Set by the guardrail when generation must run again; cleared by
    /// the generation node
    pub regeneration_requested: bool,

    pub answer: Option<Answer>,
    pub rag_unavailable: bool,
    pub regenerated: bool,
    pub hook_output: Option<serde_json::Value>,

    pub memory_summary: String,
    pub memory_facts: Vec<String>,
}

impl RequestState {
    pub fn new(query: impl Into<String>, session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain: String::new(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            messages: vec![],
            execution_plan: ExecutionPlan::default(),
            tool_results: vec![],
            citations: vec![],
            observation: None,
            replan_count: 0,
            retry_count: 0,
            validation_errors: vec![],
            regeneration_requested: false,
            answer: None,
            rag_unavailable: false,
            regenerated: false,
            hook_output: None,
            memory_summary: String::new(),
            memory_facts: vec![],
        }
    }
}

/// Delta produced by one pipeline node
///
/// `Option` fields replace the target field when set; `tool_results`
/// appends. Citations merge keyed by source id: replan passes re-retrieve
/// overlapping sources, and each source appears at most once in the state.
#[derive(Debug, Default)]
pub struct StatePatch {
    pub domain: Option<String>,
    pub execution_plan: Option<ExecutionPlan>,
    pub tool_results: Vec<ToolResult>,
    pub citations: Vec<Citation>,
    pub observation: Option<Observation>,
    pub replan_count: Option<u32>,
    pub retry_count: Option<u32>,
    pub validation_errors: Option<Vec<String>>,
    pub regeneration_requested: Option<bool>,
    pub answer: Option<Answer>,
    pub rag_unavailable: Option<bool>,
    pub regenerated: Option<bool>,
    pub hook_output: Option<serde_json::Value>,
    pub messages: Option<Vec<Message>>,
    pub memory_summary: Option<String>,
    pub memory_facts: Option<Vec<String>>,
}

impl StatePatch {
    /// Merge this patch into the state
    pub fn apply(self, state: &mut RequestState) {
        if let Some(domain) = self.domain {
            state.domain = domain;
        }
        if let Some(plan) = self.execution_plan {
            state.execution_plan = plan;
        }
        state.tool_results.extend(self.tool_results);
        for citation in self.citations {
            if state.citations.iter().all(|c| c.source_id != citation.source_id) {
                state.citations.push(citation);
            }
        }
        if let Some(observation) = self.observation {
            state.observation = Some(observation);
        }
        if let Some(count) = self.replan_count {
            state.replan_count = count;
        }
        if let Some(count) = self.retry_count {
            state.retry_count = count;
        }
        if let Some(errors) = self.validation_errors {
            state.validation_errors = errors;
        }
        if let Some(flag) = self.regeneration_requested {
            state.regeneration_requested = flag;
        }
        if let Some(answer) = self.answer {
            state.answer = Some(answer);
        }
        if let Some(flag) = self.rag_unavailable {
            state.rag_unavailable = flag;
        }
        if let Some(flag) = self.regenerated {
            state.regenerated = flag;
        }
        if let Some(output) = self.hook_output {
            state.hook_output = Some(output);
        }
        if let Some(messages) = self.messages {
            state.messages = messages;
        }
        if let Some(summary) = self.memory_summary {
            state.memory_summary = summary;
        }
        if let Some(facts) = self.memory_facts {
            state.memory_facts = facts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_replaces_scalars_and_appends_vecs() {
        let mut state = RequestState::new("q", "s", "u");
        state.citations.push(Citation {
            source_id: "KB-IT-001".to_string(),
            title: "first".to_string(),
            score: 0.9,
            excerpt: String::new(),
        });

        let patch = StatePatch {
            domain: Some("it".to_string()),
            citations: vec![Citation {
                source_id: "KB-IT-002".to_string(),
                title: "second".to_string(),
                score: 0.8,
                excerpt: String::new(),
            }],
            retry_count: Some(1),
            validation_errors: Some(vec!["bad citation".to_string()]),
            ..Default::default()
        };
        patch.apply(&mut state);

        assert_eq!(state.domain, "it");
        assert_eq!(state.citations.len(), 2);
        assert_eq!(state.retry_count, 1);
        assert_eq!(state.validation_errors, vec!["bad citation"]);
    }

    #[test]
    fn test_patch_merges_citations_by_source_id() {
        let mut state = RequestState::new("q", "s", "u");
        state.citations.push(Citation {
            source_id: "KB-IT-0001".to_string(),
            title: "vpn".to_string(),
            score: 0.9,
            excerpt: String::new(),
        });

        // A replan pass retrieving the same source again
        let patch = StatePatch {
            citations: vec![
                Citation {
                    source_id: "KB-IT-0001".to_string(),
                    title: "vpn".to_string(),
                    score: 0.7,
                    excerpt: String::new(),
                },
                Citation {
                    source_id: "KB-IT-0002".to_string(),
                    title: "wifi".to_string(),
                    score: 0.6,
                    excerpt: String::new(),
                },
            ],
            ..Default::default()
        };
        patch.apply(&mut state);

        assert_eq!(state.citations.len(), 2);
        assert_eq!(state.citations[0].score, 0.9, "first retrieval wins");
        assert_eq!(state.citations[1].source_id, "KB-IT-0002");
    }

    #[test]
    fn test_patch_replaces_validation_errors() {
        let mut state = RequestState::new("q", "s", "u");
        state.validation_errors = vec!["answer body is empty".to_string()];

        let patch = StatePatch {
            validation_errors: Some(vec!["citation id 'x' is malformed".to_string()]),
            ..Default::default()
        };
        patch.apply(&mut state);

        assert_eq!(state.validation_errors, vec!["citation id 'x' is malformed"]);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut state = RequestState::new("q", "s", "u");
        state.domain = "hr".to_string();
        state.replan_count = 2;
        let before = format!("{state:?}");

        StatePatch::default().apply(&mut state);
        assert_eq!(format!("{state:?}"), before);
    }

    #[test]
    fn test_patch_replaces_message_window() {
        let mut state = RequestState::new("q", "s", "u");
        state.messages = vec![Message::user("old")];

        let patch = StatePatch {
            messages: Some(vec![Message::user("old"), Message::assistant("new")]),
            ..Default::default()
        };
        patch.apply(&mut state);
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_answer_text_skips_empty_sections() {
        let answer = Answer {
            greeting: String::new(),
            body: "Install the VPN client.".to_string(),
            closing: "Best regards".to_string(),
        };
        assert_eq!(answer.text(), "Install the VPN client.\n\nBest regards");
    }
}
