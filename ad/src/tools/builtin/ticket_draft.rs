//! Support-ticket draft tool
//!
//! Builds a ticket skeleton deterministically; no external I/O.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError};

pub struct TicketDraftTool;

#[async_trait]
impl Tool for TicketDraftTool {
    fn name(&self) -> &'static str {
        "ticket_draft"
    }

    fn description(&self) -> &'static str {
        "Draft a support ticket skeleton from a short problem summary. \
         Does not file the ticket."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One-line problem summary"
                },
                "details": {
                    "type": "string",
                    "description": "Optional longer description"
                }
            },
            "required": ["summary"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let summary = input
            .get("summary")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidInput("summary is required".to_string()))?;
        let details = input.get("details").and_then(Value::as_str).unwrap_or_default();

        debug!(%summary, domain = %ctx.domain, "TicketDraftTool::execute: called");
        Ok(json!({
            "title": summary.chars().take(80).collect::<String>(),
            "body": details,
            "domain": ctx.domain,
            "requester": ctx.user_id,
            "status": "draft",
        }))
    }
}
