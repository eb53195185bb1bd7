//! AnswerDaemon - Bounded Conversational RAG Pipeline
//!
//! AnswerDaemon answers workplace questions by driving each request
//! through a fixed graph: intent classification, bounded planning, tool
//! and retrieval execution, evidence observation, guarded generation,
//! and memory reduction. Loops are budgeted, never open-ended.
//!
//! # Core Concepts
//!
//! - **Bounded Loops**: At most 2 replans and 2 regenerations per request
//! - **Patch-Only State**: Nodes return patches; only the executor mutates
//! - **Fail-Safe Answers**: Strict domains refuse without evidence,
//!   relaxed domains warn
//! - **Degrade, Don't Die**: Model and tool failures fall back to
//!   deterministic behavior
//!
//! # Modules
//!
//! - [`pipeline`] - Graph executor, nodes, and routing
//! - [`domain`] - Request state, plans, and messages
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`tools`] - Tool system and plan runner
//! - [`memory`] - Conversation memory reduction
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod hooks;
pub mod llm;
pub mod memory;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod policy;
pub mod prompts;
pub mod retrieval;
pub mod runner;
pub mod tools;

// Re-export commonly used types
pub use cache::{Cache, MemoryCache};
pub use config::{CacheConfig, Config, LlmConfig, MemoryConfig, PipelineConfig, RetrievalConfig, ToolsConfig};
pub use domain::{
    Answer, Citation, ExecutionPlan, Message, NextAction, Observation, PlanOutline, PlanStep, RequestState, Role,
    StatePatch, ToolResult, ToolStatus,
};
pub use error::PipelineError;
pub use hooks::{TicketDraftHook, WorkflowHook};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use metrics::{LogMetricsSink, MetricsSink, MetricsSnapshot, PipelineMetrics};
pub use pipeline::{GraphExecutor, NodeContext, NodeId, PipelineNode};
pub use policy::{DomainPolicies, DomainPolicy, FailSafeMode};
pub use retrieval::{CorpusEntry, Retriever, StaticRetriever};
pub use runner::{AnswerResponse, AskRequest, Pipeline, PipelineBuilder};
pub use tools::{PlanRunner, Tool, ToolCatalog, ToolContext, ToolError};
