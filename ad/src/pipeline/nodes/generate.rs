//! Answer generation node
//!
//! Applies the domain fail-safe before any model call: strict domains
//! refuse outright on zero citations, relaxed domains answer behind a
//! fixed warning prefix the node enforces itself. Owns the regenerated
//! flag and clears the guardrail's regeneration request.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{Answer, RequestState, StatePatch};
use crate::error::PipelineError;
use crate::llm::CompletionRequest;
use crate::parser;
use crate::pipeline::context::NodeContext;
use crate::pipeline::graph::{NodeId, PipelineNode};
use crate::policy::{DomainPolicy, FailSafeMode};

/// Verbatim refusal for strict domains with no grounding evidence
pub const REFUSAL_TEMPLATE: &str = "I don't have enough verified information to answer that. \
Please contact the responsible team directly, or rephrase your question so I can search for \
relevant documentation.";

/// Prefix enforced on ungrounded relaxed-mode answers
pub const WARNING_PREFIX: &str = "Note: I could not find supporting documentation for this \
answer, so the following is general guidance only.";

/// Minimal answer when the model output cannot be parsed
pub const FALLBACK_BODY: &str = "I found relevant information but could not compose a full \
answer. Please review the cited sources directly.";

pub struct GenerateNode;

#[async_trait]
impl PipelineNode for GenerateNode {
    fn id(&self) -> NodeId {
        NodeId::Generate
    }

    async fn run(&self, state: &RequestState, ctx: &NodeContext) -> Result<StatePatch, PipelineError> {
        let policy = ctx.policies.policy_for(&state.domain);
        debug!(domain = %state.domain, citations = state.citations.len(), retry = state.retry_count, "GenerateNode::run: called");

        let answer = if state.citations.is_empty() && policy.fail_safe == FailSafeMode::Strict {
            // Deterministic refusal; no model call, no trailing question
            debug!("run: strict fail-safe refusal");
            Answer::body_only(REFUSAL_TEMPLATE)
        } else {
            let mut answer = match self.generate_by_llm(state, ctx).await {
                Some(answer) => answer,
                None => {
                    warn!("run: generation failed, using fallback answer");
                    Answer::body_only(FALLBACK_BODY)
                }
            };

            if state.citations.is_empty() {
                // Relaxed mode: the model is not trusted to include the warning
                if !answer.body.starts_with(WARNING_PREFIX) {
                    answer.body = format!("{WARNING_PREFIX}\n\n{}", answer.body);
                }
            }

            apply_trailing_question(&mut answer, policy);
            answer
        };

        Ok(StatePatch {
            answer: Some(answer),
            regenerated: Some(state.retry_count > 0),
            regeneration_requested: Some(false),
            ..Default::default()
        })
    }
}

/// Append the domain's trailing question unless already present
fn apply_trailing_question(answer: &mut Answer, policy: &DomainPolicy) {
    if let Some(question) = &policy.trailing_question
        && !answer.body.trim_end().ends_with(question.as_str())
    {
        answer.body = format!("{}\n\n{question}", answer.body.trim_end());
    }
}

impl GenerateNode {
    async fn generate_by_llm(&self, state: &RequestState, ctx: &NodeContext) -> Option<Answer> {
        let prompt = ctx
            .prompts
            .render(
                "answer",
                &json!({
                    "query": state.query,
                    "domain": state.domain,
                    "summary": state.memory_summary,
                    "facts": state.memory_facts,
                    "citations": state.citations,
                    "feedback": state.validation_errors,
                }),
            )
            .ok()?;

        let response = ctx.complete(CompletionRequest::prompt(prompt, &state.query, 2048)).await.ok()?;
        let answer: Answer = parser::parse_json(&response.content.unwrap_or_default()).ok()?;

        if answer.body.trim().is_empty() {
            warn!("generate_by_llm: empty body");
            return None;
        }
        Some(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DomainPolicies;

    #[test]
    fn test_trailing_question_appended_once() {
        let policies = DomainPolicies::builtin();
        let policy = policies.policy_for("it");
        let question = policy.trailing_question.clone().unwrap();

        let mut answer = Answer::body_only("Install the client. [KB-IT-0001]");
        apply_trailing_question(&mut answer, policy);
        assert!(answer.body.ends_with(&question));

        let len_after_first = answer.body.len();
        apply_trailing_question(&mut answer, policy);
        assert_eq!(answer.body.len(), len_after_first);
    }

    #[test]
    fn test_no_trailing_question_for_other_domains() {
        let policies = DomainPolicies::builtin();
        let mut answer = Answer::body_only("Vacation accrues monthly.");
        apply_trailing_question(&mut answer, policies.policy_for("hr"));
        assert_eq!(answer.body, "Vacation accrues monthly.");
    }
}
