pub mod generate;
pub mod guardrail;
pub mod hook;
pub mod intent;
pub mod memory;
pub mod metrics;
pub mod observe;
pub mod plan;
pub mod retrieve;
pub mod tools;

pub use generate::{GenerateNode, FALLBACK_BODY, REFUSAL_TEMPLATE, WARNING_PREFIX};
pub use guardrail::GuardrailNode;
pub use hook::HookNode;
pub use intent::IntentNode;
pub use memory::MemoryNode;
pub use metrics::MetricsNode;
pub use observe::ObserveNode;
pub use plan::PlanNode;
pub use retrieve::RetrievalNode;
pub use tools::ToolsNode;
