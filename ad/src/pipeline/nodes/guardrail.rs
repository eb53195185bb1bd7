//! Guardrail node
//!
//! Validates the generated answer and owns retry_count: the counter
//! increments only when a regeneration will actually happen. At the
//! retry budget the answer passes through with its errors recorded.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::domain::{RequestState, StatePatch};
use crate::error::PipelineError;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};
use crate::policy::DomainPolicy;

pub struct GuardrailNode;

#[async_trait]
impl PipelineNode for GuardrailNode {
    fn id(&self) -> NodeId {
        NodeId::Guardrail
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        debug!(retry = state.retry_count, "GuardrailNode::run: called");
        let policy = ctx.policies.policy_for(&state.domain);
        let errors = validate(state, policy);

        if errors.is_empty() {
            // Clear feedback left by an earlier failed pass
            return Ok(StatePatch {
                validation_errors: Some(vec![]),
                ..Default::default()
            });
        }

        if state.retry_count < ctx.config.max_retries {
            warn!(errors = errors.len(), "run: validation failed, requesting regeneration");
            Ok(StatePatch {
                retry_count: Some(state.retry_count + 1),
                validation_errors: Some(errors),
                regeneration_requested: Some(true),
                ..Default::default()
            })
        } else {
            warn!(errors = errors.len(), "run: retry budget exhausted, passing answer through");
            Ok(StatePatch {
                validation_errors: Some(errors),
                regeneration_requested: Some(false),
                ..Default::default()
            })
        }
    }
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("reference regex"))
}

/// Citation ids the answer body cites in bracketed references
fn referenced_ids(body: &str) -> impl Iterator<Item = &str> {
    reference_regex()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn validate(state: &RequestState, policy: &DomainPolicy) -> Vec<String> {
    let mut errors = Vec::new();

    let body = state
        .answer
        .as_ref()
        .map(|a| a.body.trim())
        .unwrap_or_default();
    if body.is_empty() {
        errors.push("answer body is empty".to_string());
    }

    // Format rules apply to the ids the body actually cites, so the
    // regeneration feedback targets text the model can change
    if let Some(pattern) = &policy.citation_pattern {
        for id in referenced_ids(body) {
            if !pattern.is_match(id) {
                let error = format!("citation id '{id}' is malformed");
                if !errors.contains(&error) {
                    errors.push(error);
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Answer, Citation};
    use crate::policy::DomainPolicies;

    fn state_with(domain: &str, body: &str, source_id: &str) -> RequestState {
        let mut state = RequestState::new("q", "s", "u");
        state.domain = domain.to_string();
        state.answer = Some(Answer::body_only(body));
        state.citations.push(Citation {
            source_id: source_id.to_string(),
            title: "doc".to_string(),
            score: 1.0,
            excerpt: String::new(),
        });
        state
    }

    #[test]
    fn test_valid_answer_passes() {
        let policies = DomainPolicies::builtin();
        let state = state_with("it", "Use the VPN client. [KB-IT-0001]", "KB-IT-0001");
        assert!(validate(&state, policies.policy_for("it")).is_empty());
    }

    #[test]
    fn test_empty_body_fails() {
        let policies = DomainPolicies::builtin();
        let state = state_with("general", "  ", "KB-IT-0001");
        let errors = validate(&state, policies.policy_for("general"));
        assert_eq!(errors, vec!["answer body is empty".to_string()]);
    }

    #[test]
    fn test_malformed_referenced_id_fails_for_it() {
        let policies = DomainPolicies::builtin();
        let state = state_with("it", "Answer text. [kb-it-1]", "kb-it-1");
        let errors = validate(&state, policies.policy_for("it"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("kb-it-1"));
    }

    #[test]
    fn test_unreferenced_retrieved_id_is_not_validated() {
        let policies = DomainPolicies::builtin();
        let state = state_with("it", "Answer text. [KB-IT-0001]", "kb-it-bad");
        assert!(validate(&state, policies.policy_for("it")).is_empty());
    }

    #[test]
    fn test_repeated_malformed_reference_reports_one_error() {
        let policies = DomainPolicies::builtin();
        let state = state_with("it", "First [kb-it-1], and again [kb-it-1].", "kb-it-1");
        assert_eq!(validate(&state, policies.policy_for("it")).len(), 1);
    }

    #[test]
    fn test_no_citation_pattern_for_general() {
        let policies = DomainPolicies::builtin();
        let state = state_with("general", "Answer text.", "whatever");
        assert!(validate(&state, policies.policy_for("general")).is_empty());
    }
}
