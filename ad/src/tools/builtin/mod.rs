//! Builtin tools

pub mod calculator;
pub mod knowledge_search;
pub mod ticket_draft;

pub use calculator::CalculatorTool;
pub use knowledge_search::KnowledgeSearchTool;
pub use ticket_draft::TicketDraftTool;
