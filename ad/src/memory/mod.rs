//! Conversational memory reduction

pub mod reducer;

pub use reducer::{MemoryDelta, dedupe_and_truncate, merge_facts, reduce};
