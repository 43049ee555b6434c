//! Embedding configuration.

use kbhub_core::AppConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings used to construct an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "hashed", "ollama", "openai"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum number of texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Base URL override for remote providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key for providers that need one
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashed".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            endpoint: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    /// Derive embedding settings from the application config.
    ///
    /// The LLM endpoint is reused only when embeddings go to the same provider.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let endpoint = if config.embedding_provider == config.provider {
            config.endpoint.clone()
        } else {
            None
        };

        Self {
            provider: config.embedding_provider.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions(),
            batch_size: default_batch_size(),
            endpoint,
            api_key: config.api_key.clone(),
            timeout_secs: config.request_timeout_secs,
        }
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
