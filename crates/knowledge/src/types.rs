//! Knowledge base type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One question/answer row from the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    /// Text stored and embedded for this record.
    pub fn document_text(&self) -> String {
        format!("Q: {}\nA: {}", self.question, self.answer)
    }
}

/// A stored document with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Row position in the source dataset
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

/// Metadata recorded alongside a built index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Embedding provider used at build time
    pub provider: String,

    /// Embedding model used at build time
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Number of documents stored
    pub documents: usize,

    /// When the index was built
    pub built_at: DateTime<Utc>,
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Documents written to the index
    pub documents: usize,

    /// Embedding dimensions
    pub dimensions: usize,

    /// Index database file
    pub index_file: PathBuf,

    /// Build duration in seconds
    pub duration_secs: f64,
}

/// Statistics for an existing index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Index database file
    pub index_file: PathBuf,

    /// Document count actually stored
    pub documents: usize,

    /// Metadata recorded at build time
    pub meta: IndexMeta,

    /// Database size on disk
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_text_format() {
        let record = QaRecord {
            question: "Who wrote the Federalist Papers?".to_string(),
            answer: "Hamilton, Madison, and Jay.".to_string(),
        };
        assert_eq!(
            record.document_text(),
            "Q: Who wrote the Federalist Papers?\nA: Hamilton, Madison, and Jay."
        );
    }

    #[test]
    fn test_document_serialization_skips_empty_embedding() {
        let doc = Document {
            position: 3,
            text: "Q: a\nA: b".to_string(),
            embedding: Vec::new(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("embedding"));

        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.position, 3);
        assert!(back.embedding.is_empty());
    }
}
