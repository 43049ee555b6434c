//! OpenAI embedding provider.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use kbhub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// OpenAI `/embeddings` provider.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiProvider {
    /// Create a provider for an OpenAI-compatible embeddings endpoint.
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>) -> AppResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Config(
                "OpenAI embeddings require an API key".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .as_deref()
                .unwrap_or(DEFAULT_OPENAI_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn order_embeddings(
        &self,
        mut response: EmbeddingResponse,
        expected: usize,
    ) -> AppResult<Vec<Vec<f32>>> {
        if response.data.len() != expected {
            return Err(AppError::Knowledge(format!(
                "OpenAI returned {} embeddings for {} inputs",
                response.data.len(),
                expected
            )));
        }

        response.data.sort_by_key(|d| d.index);

        response
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(AppError::Knowledge(format!(
                        "OpenAI model '{}' returned {} dimensions, expected {}",
                        self.model,
                        d.embedding.len(),
                        self.dimensions
                    )))
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::ModelUnavailable(format!("Failed to reach OpenAI embeddings: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModelUnavailable(format!(
                "OpenAI embeddings error ({}): {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to parse OpenAI embedding response: {}", e))
        })?;

        self.order_embeddings(body, texts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimensions: usize) -> OpenAiProvider {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions,
            ..Default::default()
        };
        OpenAiProvider::new(&config, "sk-test").unwrap()
    }

    #[test]
    fn test_empty_key_rejected() {
        let config = EmbeddingConfig::default();
        let result = OpenAiProvider::new(&config, "  ");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_response_is_reordered_by_index() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        }))
        .unwrap();

        let ordered = provider(2).order_embeddings(response, 2).unwrap();
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "data": [{"index": 0, "embedding": [1.0, 0.0, 0.0]}]
        }))
        .unwrap();

        let err = provider(2).order_embeddings(response, 1).unwrap_err();
        assert!(err.to_string().contains("3 dimensions"));
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let response: EmbeddingResponse =
            serde_json::from_value(serde_json::json!({ "data": [] })).unwrap();
        assert!(provider(2).order_embeddings(response, 1).is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let embeddings = provider(2).embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
