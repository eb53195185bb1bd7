//! Tool system: trait, registry, builtins, and plan execution

pub mod builtin;
pub mod context;
pub mod error;
pub mod executor;
pub mod traits;

pub use context::ToolContext;
pub use error::ToolError;
pub use executor::{PlanRunner, ToolCatalog, citations_from_results};
pub use traits::{Tool, ToolDefinition};

/// Name of the retrieval tool; plans made only of this route as rag_only
pub const KNOWLEDGE_SEARCH: &str = "knowledge_search";
