//! Hindsight configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main hindsight configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HindsightConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Slack channel configuration
    #[serde(default)]
    pub slack: SlackConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Answer synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl HindsightConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Slack channel configuration
///
/// Secrets are never stored in the config file; the `*_env` fields name the
/// environment variables to read them from at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Slack Web API base URL (overridable for tests)
    pub api_base_url: String,

    /// Channel name to join on startup (empty = don't join)
    pub channel: String,

    /// Environment variable holding the bot token (`xoxb-...`)
    pub bot_token_env: String,

    /// Environment variable holding the signing secret
    pub signing_secret_env: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://slack.com/api".to_string(),
            channel: "bot-testing".to_string(),
            bot_token_env: "SLACK_BOT_TOKEN".to_string(),
            signing_secret_env: "SLACK_SIGNING_SECRET".to_string(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Embedding model name
    pub model: String,

    /// Expected vector dimensions
    pub dimensions: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Answer synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,

    /// Chat model name
    pub model: String,

    /// Optional sampling temperature
    pub temperature: Option<f32>,

    /// Optional completion token cap
    pub max_tokens: Option<u32>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of records in the grounding context
    pub context_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            context_size: crate::memory::DEFAULT_CONTEXT_SIZE,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base directory for persisted records
    pub base_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: dirs_next::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".hindsight"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HindsightConfig::default();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.retrieval.context_size, 20);
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.slack.api_base_url, "https://slack.com/api");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: HindsightConfig = toml::from_str(
            r#"
            [gateway]
            host = "0.0.0.0"
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.gateway.port, 8080);
        // Untouched sections fall back to defaults
        assert_eq!(config.retrieval.context_size, 20);
        assert_eq!(config.synthesis.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_config_round_trip() {
        let config = HindsightConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: HindsightConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.embedding.model, config.embedding.model);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = HindsightConfig::load(Path::new("/nonexistent/hindsight.toml"));
        assert!(matches!(result, Err(crate::error::Error::Config(_))));
    }
}
