//! Knowledge base for the Knowledge Hub.
//!
//! Turns a question/answer dataset into a SQLite vector index and retrieves
//! the documents closest to a query.

pub mod build;
pub mod dataset;
pub mod embeddings;
pub mod index;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use build::build_index;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::SqliteIndex;
pub use retriever::{index_stats, Retriever, VectorRetriever};
pub use types::{BuildStats, Document, IndexMeta, IndexStats, QaRecord};
pub use vector_index::{MemoryIndex, VectorIndex};
