//! Index construction from the question/answer dataset.

use crate::dataset;
use crate::embeddings::EmbeddingProvider;
use crate::index::SqliteIndex;
use crate::types::{BuildStats, Document, IndexMeta};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use kbhub_core::{AppError, AppResult};
use std::path::Path;
use std::time::Instant;

/// Build (or rebuild) the index in `index_dir` from the dataset at `dataset_path`.
///
/// Every record is embedded before the database is touched, so a failed
/// embedding run leaves an existing index intact.
pub async fn build_index(
    dataset_path: &Path,
    index_dir: &Path,
    embedder: &dyn EmbeddingProvider,
    batch_size: usize,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    tracing::info!(
        "Building index from {:?} with {} ({})",
        dataset_path,
        embedder.provider_name(),
        embedder.model_name()
    );

    let records = dataset::read_records(dataset_path)?;
    let texts: Vec<String> = records.iter().map(|r| r.document_text()).collect();

    let mut documents = Vec::with_capacity(texts.len());
    for (batch_idx, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let embeddings = embedder.embed_batch(batch).await?;
        if embeddings.len() != batch.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding provider returned {} vectors for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        let offset = documents.len();
        for (i, (text, embedding)) in batch.iter().zip(embeddings).enumerate() {
            if embedding.len() != embedder.dimensions() {
                return Err(AppError::Knowledge(format!(
                    "Embedding for record {} has {} dimensions, expected {}",
                    offset + i,
                    embedding.len(),
                    embedder.dimensions()
                )));
            }
            documents.push(Document {
                position: (offset + i) as u32,
                text: text.clone(),
                embedding,
            });
        }

        tracing::debug!(
            "Embedded batch {} ({} of {} documents)",
            batch_idx + 1,
            documents.len(),
            texts.len()
        );
    }

    std::fs::create_dir_all(index_dir)
        .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;

    let mut index = SqliteIndex::create(index_dir)?;
    index.reset()?;
    index.add_documents(&documents)?;
    index.set_meta(IndexMeta {
        provider: embedder.provider_name().to_string(),
        model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        documents: documents.len(),
        built_at: Utc::now(),
    })?;

    let duration = start.elapsed();

    tracing::info!(
        "Index built: {} documents in {:.2}s at {:?}",
        documents.len(),
        duration.as_secs_f64(),
        index.path()
    );

    Ok(BuildStats {
        documents: documents.len(),
        dimensions: embedder.dimensions(),
        index_file: index.path().to_path_buf(),
        duration_secs: duration.as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedProvider;
    use std::fs;
    use tempfile::TempDir;

    fn write_dataset(dir: &Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("rag_dataset.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_build_index() {
        let temp = TempDir::new().unwrap();
        let dataset = write_dataset(
            temp.path(),
            "question,answer\nWhat is GDP?,Gross domestic product.\nWho wrote Leviathan?,Hobbes.\nWhen did Rome fall?,476 AD.\n",
        );
        let index_dir = temp.path().join(".kbhub/index");
        let embedder = HashedProvider::new("trigram-v1", 64);

        let stats = build_index(&dataset, &index_dir, &embedder, 2).await.unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.dimensions, 64);
        assert!(stats.index_file.exists());

        let index = SqliteIndex::open(&index_dir).unwrap();
        assert_eq!(index.len().unwrap(), 3);
        let meta = index.meta().unwrap();
        assert_eq!(meta.provider, "hashed");
        assert_eq!(meta.documents, 3);
    }

    #[tokio::test]
    async fn test_rebuild_replaces_documents() {
        let temp = TempDir::new().unwrap();
        let index_dir = temp.path().join("index");
        let embedder = HashedProvider::new("trigram-v1", 32);

        let first = write_dataset(temp.path(), "question,answer\nQ1,A1\nQ2,A2\n");
        build_index(&first, &index_dir, &embedder, 8).await.unwrap();

        let second = write_dataset(temp.path(), "question,answer\nQ3,A3\n");
        build_index(&second, &index_dir, &embedder, 8).await.unwrap();

        let index = SqliteIndex::open(&index_dir).unwrap();
        assert_eq!(index.len().unwrap(), 1);
        let results = index.search(&embedder.embed_text("Q3"), 4).unwrap();
        assert_eq!(results[0].0.text, "Q: Q3\nA: A3");
    }

    #[tokio::test]
    async fn test_missing_dataset() {
        let temp = TempDir::new().unwrap();
        let embedder = HashedProvider::new("trigram-v1", 32);

        let err = build_index(
            &temp.path().join("missing.csv"),
            &temp.path().join("index"),
            &embedder,
            8,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::DatasetNotFound(_)));
        assert!(!temp.path().join("index").exists());
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let temp = TempDir::new().unwrap();
        let dataset = write_dataset(temp.path(), "question,answer\n");
        let embedder = HashedProvider::new("trigram-v1", 32);

        let err = build_index(&dataset, &temp.path().join("index"), &embedder, 8)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyDataset(_)));
    }
}
