//! Pipeline-level error type
//!
//! Most failures degrade into response flags rather than errors; a
//! PipelineError means the request could not produce a response at all.

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Session store error: {0}")]
    Store(#[from] memorystore::StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
