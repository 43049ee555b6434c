//! LLM provider implementations.

pub mod ollama;
pub mod openai;
pub mod stub;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use stub::{StubCall, StubCallKind, StubClient};
