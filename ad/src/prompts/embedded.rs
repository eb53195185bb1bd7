//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Intent classification prompt
pub const INTENT: &str = include_str!("../../prompts/intent.pmt");

/// Planner prompt
pub const PLAN: &str = include_str!("../../prompts/plan.pmt");

/// Observation evaluator prompt
pub const OBSERVE: &str = include_str!("../../prompts/observe.pmt");

/// Answer generator prompt
pub const ANSWER: &str = include_str!("../../prompts/answer.pmt");

/// Memory reducer prompt
pub const MEMORY: &str = include_str!("../../prompts/memory.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "intent" => Some(INTENT),
        "plan" => Some(PLAN),
        "observe" => Some(OBSERVE),
        "answer" => Some(ANSWER),
        "memory" => Some(MEMORY),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_all_templates() {
        for name in ["intent", "plan", "observe", "answer", "memory"] {
            assert!(get_embedded(name).is_some(), "missing template: {name}");
        }
    }

    #[test]
    fn test_templates_carry_json_instruction() {
        for name in ["intent", "plan", "observe", "answer", "memory"] {
            assert!(get_embedded(name).unwrap().contains("JSON only"), "template {name} must demand JSON");
        }
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
