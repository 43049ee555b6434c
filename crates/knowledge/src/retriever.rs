//! Document retrieval over a built index.

use crate::embeddings::EmbeddingProvider;
use crate::index::SqliteIndex;
use crate::types::IndexStats;
use crate::vector_index::VectorIndex;
use async_trait::async_trait;
use kbhub_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Returns the documents most relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` document texts, most similar first.
    ///
    /// Fewer than `k` come back when the index holds fewer documents.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<String>>;
}

/// Retriever that embeds the query and searches a vector index.
pub struct VectorRetriever {
    index: Box<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for VectorRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorRetriever")
            .field("embedder", &self.embedder)
            .field("meta", &self.index.meta())
            .finish()
    }
}

impl VectorRetriever {
    /// Wrap an existing index.
    pub fn new(index: Box<dyn VectorIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Open the SQLite index in `index_dir` for querying with `embedder`.
    ///
    /// Fails with `IndexUnavailable` when the index is missing or was built
    /// with embeddings of a different size.
    pub fn open(index_dir: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let index = SqliteIndex::open(index_dir)?;

        if let Some(meta) = index.meta() {
            if meta.dimensions != embedder.dimensions() {
                return Err(AppError::IndexUnavailable(format!(
                    "index was built with {}-dimensional embeddings ({} / {}), but {} / {} produces {}. Rebuild the index",
                    meta.dimensions,
                    meta.provider,
                    meta.model,
                    embedder.provider_name(),
                    embedder.model_name(),
                    embedder.dimensions()
                )));
            }

            if meta.provider != embedder.provider_name() || meta.model != embedder.model_name() {
                tracing::warn!(
                    "Index was built with {} ({}) but queries use {} ({}); results may be poor",
                    meta.provider,
                    meta.model,
                    embedder.provider_name(),
                    embedder.model_name()
                );
            }
        }

        Ok(Self::new(Box::new(index), embedder))
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<String>> {
        if k == 0 {
            return Err(AppError::Config(
                "Number of documents to retrieve must be greater than zero".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self.index.search(&query_embedding, k)?;

        if let (Some((_, top)), Some((_, lowest))) = (results.first(), results.last()) {
            tracing::debug!(
                "Retrieved {} documents (top score: {:.3}, lowest: {:.3})",
                results.len(),
                top,
                lowest
            );
        }

        Ok(results.into_iter().map(|(doc, _)| doc.text).collect())
    }
}

/// Statistics for the index in `index_dir`.
pub fn index_stats(index_dir: &Path) -> AppResult<IndexStats> {
    let index = SqliteIndex::open(index_dir)?;
    let documents = index.len()?;
    let meta = index
        .meta()
        .cloned()
        .ok_or_else(|| AppError::IndexUnavailable("index has no build metadata".to_string()))?;
    let db_size_bytes = std::fs::metadata(index.path()).map(|m| m.len()).unwrap_or(0);

    Ok(IndexStats {
        index_file: index.path().to_path_buf(),
        documents,
        meta,
        db_size_bytes,
    })
}
