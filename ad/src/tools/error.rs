//! Tool error types

use thiserror::Error;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ToolError::UnknownTool("frobnicate".to_string()).to_string(), "Unknown tool: frobnicate");
        assert!(ToolError::InvalidInput("missing query".to_string()).to_string().contains("missing query"));
    }
}
