//! LLM client abstraction and request/response types.
//!
//! One capability trait covers both kinds of model call the workflow makes:
//! free-form completion and a structured accept/reject decision.

use crate::decision::{parse_decision, CheckDecision, DECISION_FORMAT_INSTRUCTIONS};
use kbhub_core::AppResult;
use serde::{Deserialize, Serialize};

/// LLM completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The user message sent to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2", "gpt-4o")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Ask the provider to constrain output to a JSON object
    #[serde(default)]
    pub json_output: bool,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            system: None,
            json_output: false,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Request JSON-only output.
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Turn a checking request into a structured-decision request.
    ///
    /// Appends the decision format instructions to the system prompt and
    /// switches the provider into JSON mode.
    pub fn into_decision_request(self) -> Self {
        let system = match self.system {
            Some(ref system) => {
                format!("{}\n\n{}", system.trim_end(), DECISION_FORMAT_INSTRUCTIONS)
            }
            None => DECISION_FORMAT_INSTRUCTIONS.to_string(),
        };
        Self {
            system: Some(system),
            json_output: true,
            ..self
        }
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Whether the response was complete
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations never retry: a transport failure surfaces immediately as
/// `AppError::ModelUnavailable`.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama", "openai", "stub").
    fn provider_name(&self) -> &str;

    /// Perform a free-form completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;

    /// Ask for a structured accept/reject decision.
    ///
    /// The default implementation runs a JSON-mode completion and parses it.
    /// A reply that cannot be parsed is `AppError::ModelMalformedOutput`.
    async fn decide(&self, request: &LlmRequest) -> AppResult<CheckDecision> {
        let request = request.clone().into_decision_request();
        let response = self.complete(&request).await?;
        parse_decision(&response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Hello", "gpt-4o")
            .with_system("Be brief")
            .with_temperature(0.0)
            .with_max_tokens(64);

        assert_eq!(request.prompt, "Hello");
        assert_eq!(request.system.as_deref(), Some("Be brief"));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(64));
        assert!(!request.json_output);
    }

    #[test]
    fn test_into_decision_request() {
        let request = LlmRequest::new("Is it valid?", "gpt-4o-mini")
            .with_system("You are an answer checker.\n")
            .into_decision_request();

        assert!(request.json_output);
        let system = request.system.unwrap();
        assert!(system.starts_with("You are an answer checker."));
        assert!(system.contains("\"decision\""));
    }

    #[test]
    fn test_usage_totals() {
        let usage = LlmUsage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }
}
