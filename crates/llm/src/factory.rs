//! LLM provider factory.
//!
//! Selects the client implementation from configuration at construction
//! time. Callers only ever see `Arc<dyn LlmClient>`.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient, StubClient};
use crate::types::ProviderType;
use kbhub_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai", "stub")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by "openai"
/// * `timeout` - Per-request HTTP timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, a required key is
/// missing, or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(provider = provider_type.as_str(), ?endpoint, "Creating LLM client");

    match provider_type {
        ProviderType::Ollama => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url, timeout)?,
                None => OllamaClient::new(timeout)?,
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => OpenAiClient::with_base_url(url, key, timeout)?,
                None => OpenAiClient::new(key, timeout)?,
            };
            Ok(Arc::new(client))
        }
        ProviderType::Stub => Ok(Arc::new(StubClient::new())),
    }
}
