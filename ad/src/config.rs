//! answerdaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{MAX_FACTS, MAX_PLAN_STEPS, MAX_REPLAN, MAX_RETRY, MESSAGE_WINDOW};

/// Main answerdaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Pipeline loop bounds and window sizes
    pub pipeline: PipelineConfig,

    /// Tool execution limits
    pub tools: ToolsConfig,

    /// Retrieval configuration
    pub retrieval: RetrievalConfig,

    /// Idempotency cache configuration
    pub cache: CacheConfig,

    /// Session memory configuration
    pub memory: MemoryConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.pipeline.message_window == 0 {
            return Err(eyre::eyre!("pipeline.message-window must be at least 1"));
        }
        if self.pipeline.max_plan_steps == 0 {
            return Err(eyre::eyre!("pipeline.max-plan-steps must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .answerdaemon.yml
        let local_config = PathBuf::from(".answerdaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/answerdaemon/answerdaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("answerdaemon").join("answerdaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 60_000,
        }
    }
}

/// Pipeline loop bounds and window sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum observation-driven replans per request
    #[serde(rename = "max-replans")]
    pub max_replans: u32,

    /// Maximum guardrail-driven regenerations per request
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Rolling conversation window length
    #[serde(rename = "message-window")]
    pub message_window: usize,

    /// Maximum persisted memory facts
    #[serde(rename = "max-facts")]
    pub max_facts: usize,

    /// Maximum steps per execution plan
    #[serde(rename = "max-plan-steps")]
    pub max_plan_steps: usize,

    /// Citation count for the observation fast path
    #[serde(rename = "sufficiency-citations")]
    pub sufficiency_citations: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_replans: MAX_REPLAN,
            max_retries: MAX_RETRY,
            message_window: MESSAGE_WINDOW,
            max_facts: MAX_FACTS,
            max_plan_steps: MAX_PLAN_STEPS,
            sufficiency_citations: 3,
        }
    }
}

/// Tool execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Default per-tool timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retry attempts after the first failure
    pub retries: u32,

    /// Base backoff delay between attempts in milliseconds
    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            retries: 2,
            backoff_ms: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Results per retrieval call
    #[serde(rename = "top-k")]
    pub top_k: usize,

    /// Optional path to a YAML corpus for the static retriever
    #[serde(rename = "corpus-path")]
    pub corpus_path: Option<PathBuf>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            corpus_path: None,
        }
    }
}

/// Idempotency cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Replay TTL in seconds
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Session memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Path to the sessions database file
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// Disable persistence entirely (memory lives for one process only)
    pub ephemeral: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        let store_path = dirs::data_dir()
            .map(|d| d.join("answerdaemon"))
            .unwrap_or_else(|| PathBuf::from(".answerdaemon"))
            .join("sessions.db");

        Self {
            store_path,
            ephemeral: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.pipeline.max_replans, 2);
        assert_eq!(config.pipeline.max_retries, 2);
        assert_eq!(config.pipeline.message_window, 8);
        assert_eq!(config.tools.timeout_ms, 10_000);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o-mini
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 2048
  timeout-ms: 30000

pipeline:
  max-replans: 1
  sufficiency-citations: 5

tools:
  timeout-ms: 2000
  retries: 1
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.pipeline.max_replans, 1);
        assert_eq!(config.pipeline.sufficiency_citations, 5);
        assert_eq!(config.tools.timeout_ms, 2000);
        assert_eq!(config.tools.retries, 1);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: gpt-4o-mini
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.pipeline.max_retries, 2);
        assert_eq!(config.retrieval.top_k, 4);
    }

    #[test]
    #[serial]
    fn test_config_validation_missing_api_key() {
        let mut config = Config::default();
        config.llm.api_key_env = "NONEXISTENT_TEST_API_KEY_12345".to_string();

        let result = config.validate();

        assert!(result.is_err(), "Should fail without API key");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("NONEXISTENT_TEST_API_KEY_12345"));
    }

    #[test]
    #[serial]
    fn test_config_validation_with_api_key() {
        // SAFETY: serialized test, no concurrent env access
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "test-key");
        }

        let config = Config::default();
        let result = config.validate();

        // SAFETY: serialized test, no concurrent env access
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }

        assert!(result.is_ok(), "Should pass with API key set");
    }

    #[test]
    #[serial]
    fn test_config_validation_rejects_zero_window() {
        // SAFETY: serialized test, no concurrent env access
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "test-key");
        }

        let mut config = Config::default();
        config.pipeline.message_window = 0;
        let result = config.validate();

        // SAFETY: serialized test, no concurrent env access
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }

        assert!(result.is_err());
    }
}
