//! Prompt templates and rendering

pub mod embedded;

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

pub use embedded::get_embedded;

/// Renders embedded prompt templates with handlebars
pub struct PromptSet {
    registry: Handlebars<'static>,
}

impl PromptSet {
    /// Registry with all embedded templates
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        for name in ["intent", "plan", "observe", "answer", "memory"] {
            let template = embedded::get_embedded(name).expect("embedded template");
            registry
                .register_template_string(name, template)
                .expect("embedded templates are valid handlebars");
        }
        Self { registry }
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> eyre::Result<String> {
        debug!(%name, "PromptSet::render: called");
        Ok(self.registry.render(name, data)?)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_plan_prompt() {
        let prompts = PromptSet::new();
        let rendered = prompts
            .render(
                "plan",
                &json!({
                    "domain": "it",
                    "query": "vpn setup",
                    "tools": "- knowledge_search: search docs",
                    "max_steps": 5,
                    "gaps": ["client version"],
                }),
            )
            .unwrap();

        assert!(rendered.contains("vpn setup"));
        assert!(rendered.contains("client version"));
        assert!(rendered.contains("At most 5 steps"));
    }

    #[test]
    fn test_render_intent_prompt_lists_domains() {
        let prompts = PromptSet::new();
        let rendered = prompts
            .render("intent", &json!({"query": "q", "domains": ["finance", "it"]}))
            .unwrap();
        assert!(rendered.contains("- finance"));
        assert!(rendered.contains("- it"));
    }

    #[test]
    fn test_render_answer_prompt_without_optionals() {
        let prompts = PromptSet::new();
        let rendered = prompts
            .render(
                "answer",
                &json!({"query": "q", "domain": "it", "citations": [], "facts": [], "feedback": []}),
            )
            .unwrap();
        assert!(rendered.contains("answer generator"));
        assert!(!rendered.contains("previous attempt"));
    }
}
