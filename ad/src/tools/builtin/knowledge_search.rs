//! Knowledge base search tool
//!
//! Thin wrapper over the retrieval boundary; the tool executor lifts
//! the citations in the payload into request state.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::{Tool, ToolContext, ToolError};

pub struct KnowledgeSearchTool;

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &'static str {
        crate::tools::KNOWLEDGE_SEARCH
    }

    fn description(&self) -> &'static str {
        "Search the internal knowledge base for documents relevant to a query. \
         Returns scored citations with excerpts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> Result<Value, ToolError> {
        let query = input
            .get("query")
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidInput("query is required".to_string()))?;

        debug!(%query, domain = %ctx.domain, "KnowledgeSearchTool::execute: called");
        let citations = ctx.retriever.retrieve(&ctx.domain, query, ctx.top_k).await;

        Ok(json!({
            "citations": citations,
            "count": citations.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{CorpusEntry, StaticRetriever};
    use std::sync::Arc;

    fn ctx(retriever: StaticRetriever) -> ToolContext {
        ToolContext {
            domain: "it".to_string(),
            user_id: "u-1".to_string(),
            retriever: Arc::new(retriever),
            top_k: 4,
        }
    }

    #[tokio::test]
    async fn test_search_returns_citations() {
        let retriever = StaticRetriever::new(vec![CorpusEntry {
            source_id: "KB-IT-0001".to_string(),
            title: "VPN setup".to_string(),
            domain: "it".to_string(),
            text: "Install the VPN client.".to_string(),
        }]);

        let result = KnowledgeSearchTool
            .execute(json!({"query": "vpn client"}), &ctx(retriever))
            .await
            .unwrap();

        assert_eq!(result["count"], 1);
        assert_eq!(result["citations"][0]["source_id"], "KB-IT-0001");
    }

    #[tokio::test]
    async fn test_missing_query_is_invalid_input() {
        let result = KnowledgeSearchTool.execute(json!({}), &ctx(StaticRetriever::empty())).await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_corpus_returns_zero_count() {
        let result = KnowledgeSearchTool
            .execute(json!({"query": "vpn"}), &ctx(StaticRetriever::empty()))
            .await
            .unwrap();
        assert_eq!(result["count"], 0);
    }
}
