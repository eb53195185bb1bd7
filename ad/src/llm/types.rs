//! LLM request/response types

use serde::{Deserialize, Serialize};

use crate::domain::Message;

/// A single completion request
///
/// Each call is independent; conversation context is passed explicitly
/// in `messages` every time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with a system prompt and one user message
    pub fn prompt(system_prompt: impl Into<String>, user_content: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![Message::user(user_content)],
            max_tokens,
        }
    }
}

/// A completion response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            usage: TokenUsage::default(),
        }
    }
}

/// Token usage for a completion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn test_prompt_builds_single_user_message() {
        let req = CompletionRequest::prompt("system", "hello", 512);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::User);
        assert_eq!(req.max_tokens, 512);
    }
}
