//! Embedding providers for the knowledge base.
//!
//! Every provider turns text into fixed-size vectors; the index records which
//! provider, model, and dimensions it was built with.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{HashedProvider, OllamaProvider, OpenAiProvider};
