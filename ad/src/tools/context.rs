//! Execution context passed to tools

use std::sync::Arc;

use crate::retrieval::Retriever;

/// Shared context for a batch of tool executions
#[derive(Clone)]
pub struct ToolContext {
    /// Domain the request was classified into
    pub domain: String,

    /// Requesting user
    pub user_id: String,

    /// Retrieval backend for search tools
    pub retriever: Arc<dyn Retriever>,

    /// Citations per retrieval call
    pub top_k: usize,
}
