//! LLM integration crate for the Knowledge Hub.
//!
//! Provides a provider-agnostic capability trait with two operations:
//! free-form completion and a structured accept/reject decision.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Chat completions API
//! - **Stub**: Deterministic scripted client for tests
//!
//! # Example
//! ```no_run
//! use kbhub_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(Duration::from_secs(60))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod decision;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use decision::{parse_decision, CheckDecision, Verdict};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient, StubCall, StubCallKind, StubClient};
pub use types::ProviderType;
