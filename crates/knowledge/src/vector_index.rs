//! Vector index abstraction.
//!
//! Defines a trait for backend-agnostic vector storage and retrieval, plus an
//! in-memory implementation used by tests and small throwaway indexes.

use crate::types::{Document, IndexMeta};
use kbhub_core::{AppError, AppResult};

/// Trait for vector index backends.
pub trait VectorIndex: Send + Sync {
    /// Append documents with embeddings.
    fn add_documents(&mut self, documents: &[Document]) -> AppResult<()>;

    /// Search for the top-k most similar documents to the query embedding.
    ///
    /// Returns documents ordered by descending similarity score, at most `top_k`.
    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(Document, f32)>>;

    /// Number of stored documents.
    fn len(&self) -> AppResult<usize>;

    /// Whether the index holds no documents.
    fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every document.
    fn reset(&mut self) -> AppResult<()>;

    /// Build metadata, when known.
    fn meta(&self) -> Option<&IndexMeta>;
}

/// Index that keeps every document in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    documents: Vec<Document>,
    meta: Option<IndexMeta>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach build metadata.
    pub fn with_meta(mut self, meta: IndexMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl VectorIndex for MemoryIndex {
    fn add_documents(&mut self, documents: &[Document]) -> AppResult<()> {
        if let Some(dim) = self.documents.first().map(|d| d.embedding.len()) {
            if let Some(bad) = documents.iter().find(|d| d.embedding.len() != dim) {
                return Err(AppError::Knowledge(format!(
                    "Document {} has {} dimensions, index has {}",
                    bad.position,
                    bad.embedding.len(),
                    dim
                )));
            }
        }
        self.documents.extend_from_slice(documents);
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(Document, f32)>> {
        Ok(rank(
            self.documents.iter().map(|doc| {
                let score = cosine_similarity(query_embedding, &doc.embedding);
                (doc.clone(), score)
            }),
            top_k,
        ))
    }

    fn len(&self) -> AppResult<usize> {
        Ok(self.documents.len())
    }

    fn reset(&mut self) -> AppResult<()> {
        self.documents.clear();
        Ok(())
    }

    fn meta(&self) -> Option<&IndexMeta> {
        self.meta.as_ref()
    }
}

/// Sort scored documents by descending score and keep the best `top_k`.
///
/// Equal scores keep dataset order.
pub(crate) fn rank(
    scored: impl Iterator<Item = (Document, f32)>,
    top_k: usize,
) -> Vec<(Document, f32)> {
    let mut results: Vec<(Document, f32)> = scored.collect();
    results.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.position.cmp(&b.0.position))
    });
    results.truncate(top_k);
    results
}

/// Cosine similarity between two vectors; 0.0 when lengths differ or a norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(position: u32, embedding: Vec<f32>) -> Document {
        Document {
            position,
            text: format!("Q: q{}\nA: a{}", position, position),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_score() {
        let mut index = MemoryIndex::new();
        index
            .add_documents(&[
                doc(0, vec![0.0, 1.0]),
                doc(1, vec![1.0, 0.0]),
                doc(2, vec![0.7, 0.7]),
            ])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        let positions: Vec<u32> = results.iter().map(|(d, _)| d.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_search_returns_fewer_when_index_is_small() {
        let mut index = MemoryIndex::new();
        index.add_documents(&[doc(0, vec![1.0, 0.0])]).unwrap();

        let results = index.search(&[1.0, 0.0], 4).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_ties_keep_dataset_order() {
        let mut index = MemoryIndex::new();
        index
            .add_documents(&[doc(5, vec![1.0, 0.0]), doc(2, vec![1.0, 0.0])])
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0.position, 2);
        assert_eq!(results[1].0.position, 5);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = MemoryIndex::new();
        index.add_documents(&[doc(0, vec![1.0, 0.0])]).unwrap();
        assert!(index.add_documents(&[doc(1, vec![1.0])]).is_err());
    }

    #[test]
    fn test_reset() {
        let mut index = MemoryIndex::new();
        index.add_documents(&[doc(0, vec![1.0])]).unwrap();
        assert!(!index.is_empty().unwrap());

        index.reset().unwrap();
        assert!(index.is_empty().unwrap());
        assert!(index.search(&[1.0], 3).unwrap().is_empty());
    }
}
