//! Side-effect hook boundary
//!
//! Runs after a validated answer exists. Hooks are strictly additive:
//! their output lands in `hook_output` and never alters the answer.

use serde_json::{Value, json};
use tracing::debug;

use crate::domain::{Answer, Citation};

/// Post-answer workflow hook
pub trait WorkflowHook: Send + Sync {
    /// Build an opaque draft payload from the finished answer
    fn prepare_draft(&self, domain: &str, query: &str, answer: &Answer, citations: &[Citation], user_id: &str)
    -> Value;
}

/// Default hook: drafts a support-ticket skeleton
///
/// No external I/O; downstream systems consume the draft from the
/// response if they want to file it.
#[derive(Debug, Default)]
pub struct TicketDraftHook;

impl WorkflowHook for TicketDraftHook {
    fn prepare_draft(
        &self,
        domain: &str,
        query: &str,
        answer: &Answer,
        citations: &[Citation],
        user_id: &str,
    ) -> Value {
        debug!(%domain, %user_id, citations = citations.len(), "TicketDraftHook::prepare_draft: called");
        json!({
            "kind": "ticket_draft",
            "domain": domain,
            "requester": user_id,
            "title": query.chars().take(80).collect::<String>(),
            "body": answer.body,
            "sources": citations.iter().map(|c| c.source_id.clone()).collect::<Vec<_>>(),
            "created_at": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_carries_sources_and_requester() {
        let hook = TicketDraftHook;
        let answer = Answer::body_only("Install the client.");
        let citations = vec![Citation {
            source_id: "KB-IT-0001".to_string(),
            title: "VPN".to_string(),
            score: 1.0,
            excerpt: String::new(),
        }];

        let draft = hook.prepare_draft("it", "vpn setup", &answer, &citations, "u-1");

        assert_eq!(draft["kind"], "ticket_draft");
        assert_eq!(draft["requester"], "u-1");
        assert_eq!(draft["sources"][0], "KB-IT-0001");
        assert_eq!(draft["body"], "Install the client.");
    }

    #[test]
    fn test_draft_truncates_long_titles() {
        let hook = TicketDraftHook;
        let long_query = "x".repeat(200);
        let draft = hook.prepare_draft("it", &long_query, &Answer::default(), &[], "u-1");
        assert_eq!(draft["title"].as_str().unwrap().len(), 80);
    }
}
