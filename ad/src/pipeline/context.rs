//! Shared services available to every pipeline node

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::domain::RequestState;
use crate::hooks::WorkflowHook;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::metrics::MetricsSink;
use crate::policy::DomainPolicies;
use crate::prompts::PromptSet;
use crate::retrieval::Retriever;
use crate::tools::{PlanRunner, ToolContext};

/// Collaborators and configuration shared by all nodes
pub struct NodeContext {
    pub llm: Arc<dyn LlmClient>,
    pub retriever: Arc<dyn Retriever>,
    pub runner: PlanRunner,
    pub policies: DomainPolicies,
    pub hook: Arc<dyn WorkflowHook>,
    pub metrics: Arc<dyn MetricsSink>,
    pub prompts: PromptSet,
    pub config: PipelineConfig,
    /// Citations per retrieval call
    pub top_k: usize,
}

impl NodeContext {
    /// Model call with the llm_calls counter bumped
    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.metrics.record("pipeline.llm_calls", 1.0, &[]);
        self.llm.complete(request).await
    }

    /// Tool context for the current request
    pub fn tool_ctx(&self, state: &RequestState) -> ToolContext {
        ToolContext {
            domain: state.domain.clone(),
            user_id: state.user_id.clone(),
            retriever: Arc::clone(&self.retriever),
            top_k: self.top_k,
        }
    }
}
