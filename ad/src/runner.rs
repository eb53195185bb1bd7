//! Pipeline front door
//!
//! Owns the idempotency cache and session persistence around a single
//! graph run. A replayed idempotency key returns the stored response
//! byte-identical without touching the model or any tool.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use memorystore::{now_ms, SessionRecord, SessionStore, StoredMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{Cache, MemoryCache};
use crate::config::Config;
use crate::domain::{Citation, Message, RequestState, Role};
use crate::hooks::{TicketDraftHook, WorkflowHook};
use crate::llm::{create_client, LlmClient};
use crate::metrics::{MetricsSink, PipelineMetrics};
use crate::pipeline::{GraphExecutor, NodeContext};
use crate::policy::DomainPolicies;
use crate::prompts::PromptSet;
use crate::retrieval::{Retriever, StaticRetriever};
use crate::tools::{PlanRunner, ToolCatalog};

/// One user question addressed to the pipeline
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub query: String,
    pub session_id: String,
    pub user_id: String,
    /// Skip intent classification when set to a known domain
    pub domain_hint: Option<String>,
    /// Replay key: the same key returns the same response within the TTL
    pub idempotency_key: Option<String>,
}

impl AskRequest {
    pub fn new(query: impl Into<String>, session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            domain_hint: None,
            idempotency_key: None,
        }
    }
}

/// Final response surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub domain: String,
    pub citations: Vec<Citation>,
    pub rag_unavailable: bool,
    pub validation_errors: Vec<String>,
    pub regenerated: bool,
    pub hook_output: Option<serde_json::Value>,
    pub session_id: String,
}

/// Assembles a [`Pipeline`] from configuration plus optional overrides
pub struct PipelineBuilder {
    config: Config,
    llm: Option<Arc<dyn LlmClient>>,
    retriever: Option<Arc<dyn Retriever>>,
    cache: Option<Arc<dyn Cache>>,
    hook: Option<Arc<dyn WorkflowHook>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    store: Option<SessionStore>,
}

impl PipelineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            llm: None,
            retriever: None,
            cache: None,
            hook: None,
            metrics: None,
            store: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn WorkflowHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Pipeline> {
        let llm = match self.llm {
            Some(llm) => llm,
            None => create_client(&self.config.llm).context("Failed to create LLM client")?,
        };

        let retriever: Arc<dyn Retriever> = match self.retriever {
            Some(retriever) => retriever,
            None => match &self.config.retrieval.corpus_path {
                Some(path) => Arc::new(
                    StaticRetriever::from_yaml_file(path)
                        .context(format!("Failed to load corpus from {}", path.display()))?,
                ),
                None => Arc::new(StaticRetriever::builtin()),
            },
        };

        let store = match self.store {
            Some(store) => Some(store),
            None if self.config.memory.ephemeral => None,
            None => Some(
                SessionStore::open(&self.config.memory.store_path).context("Failed to open session store")?,
            ),
        };

        let ctx = NodeContext {
            llm,
            retriever,
            runner: PlanRunner::new(ToolCatalog::standard(), &self.config.tools),
            policies: DomainPolicies::builtin(),
            hook: self.hook.unwrap_or_else(|| Arc::new(TicketDraftHook)),
            metrics: self.metrics.unwrap_or_else(|| Arc::new(PipelineMetrics::new())),
            prompts: PromptSet::new(),
            config: self.config.pipeline.clone(),
            top_k: self.config.retrieval.top_k,
        };

        Ok(Pipeline {
            executor: GraphExecutor::new(ctx),
            cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
            store,
            cache_ttl: Duration::from_secs(self.config.cache.ttl_secs),
        })
    }
}

pub struct Pipeline {
    executor: GraphExecutor,
    cache: Arc<dyn Cache>,
    store: Option<SessionStore>,
    cache_ttl: Duration,
}

impl Pipeline {
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Answer one question end to end
    pub async fn handle(&self, request: AskRequest) -> Result<AnswerResponse> {
        let request_id = uuid::Uuid::now_v7();
        debug!(%request_id, session = %request.session_id, "Pipeline::handle: called");
        let ctx = self.executor.context();

        if let Some(key) = &request.idempotency_key {
            let cache_key = format!("idem:{key}");
            if let Some(cached) = self.cache.get(&cache_key) {
                debug!(%key, "handle: idempotency replay");
                ctx.metrics.record("pipeline.cache_hits", 1.0, &[]);
                let response: AnswerResponse =
                    serde_json::from_str(&cached).context("Failed to decode cached response")?;
                return Ok(response);
            }
        }

        let mut state = RequestState::new(&request.query, &request.session_id, &request.user_id);
        if let Some(hint) = &request.domain_hint {
            state.domain = hint.trim().to_lowercase();
        }
        self.seed_from_store(&mut state)?;

        let state = self.executor.run(state).await?;

        let response = AnswerResponse {
            answer: state.answer.as_ref().map(|a| a.text()).unwrap_or_default(),
            domain: state.domain.clone(),
            citations: state.citations.clone(),
            rag_unavailable: state.rag_unavailable,
            validation_errors: state.validation_errors.clone(),
            regenerated: state.regenerated,
            hook_output: state.hook_output.clone(),
            session_id: state.session_id.clone(),
        };

        self.persist(&state)?;

        if let Some(key) = &request.idempotency_key {
            let encoded = serde_json::to_string(&response).context("Failed to encode response")?;
            self.cache.set(&format!("idem:{key}"), encoded, self.cache_ttl);
        }

        Ok(response)
    }

    fn seed_from_store(&self, state: &mut RequestState) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        if let Some(record) = store.load(&state.session_id)? {
            debug!(window = record.window.len(), facts = record.facts.len(), "seed_from_store: session found");
            state.messages = record.window.iter().map(message_from_stored).collect();
            state.memory_summary = record.summary;
            state.memory_facts = record.facts;
        }
        Ok(())
    }

    fn persist(&self, state: &RequestState) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let mut record = SessionRecord::new(&state.session_id);
        record.summary = state.memory_summary.clone();
        record.facts = state.memory_facts.clone();
        record.window = state.messages.iter().map(stored_from_message).collect();
        record.updated_at = now_ms();

        if let Err(e) = store.upsert(&record) {
            // Persistence failures never cost the caller their answer
            warn!(session = %state.session_id, "persist: upsert failed: {e}");
        }
        Ok(())
    }
}

fn message_from_stored(stored: &StoredMessage) -> Message {
    let role = if stored.role == "assistant" { Role::Assistant } else { Role::User };
    Message {
        role,
        content: stored.content.clone(),
    }
}

fn stored_from_message(message: &Message) -> StoredMessage {
    StoredMessage {
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
    }
}
