//! Embedding provider implementations.

pub mod hashed;
pub mod ollama;
pub mod openai;

pub use hashed::HashedProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
