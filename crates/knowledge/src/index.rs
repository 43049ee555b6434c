//! SQLite-backed vector index for dataset documents.

use crate::types::{Document, IndexMeta};
use crate::vector_index::{cosine_similarity, rank, VectorIndex};
use chrono::{DateTime, Utc};
use kbhub_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Database file name inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite";

/// Path of the database file for an index directory.
pub fn index_file(index_dir: &Path) -> PathBuf {
    index_dir.join(INDEX_FILE_NAME)
}

/// Create (or open) the SQLite index database, creating tables as needed.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Open an index database that must already exist.
pub fn open_existing(db_path: &Path) -> AppResult<Connection> {
    if !db_path.is_file() {
        return Err(AppError::IndexUnavailable(format!(
            "no index at {}. Run 'kbhub index build' first",
            db_path.display()
        )));
    }

    Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_WRITE).map_err(|e| {
        AppError::IndexUnavailable(format!("Failed to open {}: {}", db_path.display(), e))
    })
}

/// Insert documents in a single transaction.
pub fn insert_documents(conn: &mut Connection, documents: &[Document]) -> AppResult<()> {
    let tx = conn
        .transaction()
        .map_err(|e| AppError::Knowledge(format!("Failed to start transaction: {}", e)))?;

    {
        let mut stmt = tx
            .prepare("INSERT INTO documents (position, text, embedding) VALUES (?1, ?2, ?3)")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

        for doc in documents {
            if doc.embedding.is_empty() {
                return Err(AppError::Knowledge(format!(
                    "Document {} is missing its embedding",
                    doc.position
                )));
            }
            stmt.execute(params![
                i64::from(doc.position),
                doc.text,
                embedding_to_bytes(&doc.embedding)
            ])
            .map_err(|e| AppError::Knowledge(format!("Failed to insert document: {}", e)))?;
        }
    }

    tx.commit()
        .map_err(|e| AppError::Knowledge(format!("Failed to commit documents: {}", e)))?;
    Ok(())
}

/// Score every stored document against the query and return the top-k.
pub fn query_documents(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<(Document, f32)>> {
    let mut stmt = conn
        .prepare("SELECT position, text, embedding FROM documents")
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let position: i64 = row.get(0)?;
            let text: String = row.get(1)?;
            let bytes: Vec<u8> = row.get(2)?;
            Ok((position, text, bytes))
        })
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to query documents: {}", e)))?;

    let mut scored = Vec::new();
    for row in rows {
        let (position, text, bytes) =
            row.map_err(|e| AppError::IndexUnavailable(format!("Failed to read row: {}", e)))?;
        let embedding = bytes_to_embedding(&bytes)?;
        let score = cosine_similarity(query_embedding, &embedding);
        scored.push((
            Document {
                position: position as u32,
                text,
                embedding,
            },
            score,
        ));
    }

    let results = rank(scored.into_iter(), top_k);

    tracing::debug!(
        "Retrieved {} documents (requested top-{})",
        results.len(),
        top_k
    );

    Ok(results)
}

/// Number of stored documents.
pub fn count_documents(conn: &Connection) -> AppResult<usize> {
    conn.query_row("SELECT COUNT(*) FROM documents", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
    .map_err(|e| AppError::IndexUnavailable(format!("Failed to count documents: {}", e)))
}

/// Delete every document and all metadata.
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute_batch("DELETE FROM documents; DELETE FROM meta;")
        .map_err(|e| AppError::Knowledge(format!("Failed to reset index: {}", e)))?;

    tracing::info!("Reset knowledge index");
    Ok(())
}

/// Record build metadata, replacing previous values.
pub fn write_meta(conn: &Connection, meta: &IndexMeta) -> AppResult<()> {
    let entries = [
        ("provider", meta.provider.clone()),
        ("model", meta.model.clone()),
        ("dimensions", meta.dimensions.to_string()),
        ("documents", meta.documents.to_string()),
        ("built_at", meta.built_at.to_rfc3339()),
    ];

    for (key, value) in entries {
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to write meta '{}': {}", key, e)))?;
    }

    Ok(())
}

/// Read build metadata. `None` when the index was never completely built.
pub fn read_meta(conn: &Connection) -> AppResult<Option<IndexMeta>> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM meta")
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to read meta: {}", e)))?;

    let values: HashMap<String, String> = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .and_then(|rows| rows.collect())
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to read meta: {}", e)))?;

    let (Some(provider), Some(model), Some(dimensions), Some(documents), Some(built_at)) = (
        values.get("provider"),
        values.get("model"),
        values.get("dimensions"),
        values.get("documents"),
        values.get("built_at"),
    ) else {
        return Ok(None);
    };

    let corrupt = |key: &str| AppError::IndexUnavailable(format!("Corrupt index meta '{}'", key));

    Ok(Some(IndexMeta {
        provider: provider.clone(),
        model: model.clone(),
        dimensions: dimensions.parse().map_err(|_| corrupt("dimensions"))?,
        documents: documents.parse().map_err(|_| corrupt("documents"))?,
        built_at: DateTime::parse_from_rfc3339(built_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| corrupt("built_at"))?,
    }))
}

/// Whether a table exists in the database.
fn has_table(conn: &Connection, name: &str) -> AppResult<bool> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(|e| AppError::IndexUnavailable(format!("Failed to inspect index: {}", e)))
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::IndexUnavailable(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// A [`VectorIndex`] stored in a SQLite file.
pub struct SqliteIndex {
    path: PathBuf,
    conn: Mutex<Connection>,
    meta: Option<IndexMeta>,
}

impl std::fmt::Debug for SqliteIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteIndex")
            .field("path", &self.path)
            .field("meta", &self.meta)
            .finish()
    }
}

impl SqliteIndex {
    /// Create or open the index in `index_dir` for writing.
    pub fn create(index_dir: &Path) -> AppResult<Self> {
        let path = index_file(index_dir);
        let conn = init_index(&path)?;
        let meta = read_meta(&conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            meta,
        })
    }

    /// Open a previously built index.
    ///
    /// Fails with `IndexUnavailable` when the file is missing, lacks the
    /// expected tables, or was never completely built.
    pub fn open(index_dir: &Path) -> AppResult<Self> {
        let path = index_file(index_dir);
        let conn = open_existing(&path)?;

        for table in ["documents", "meta"] {
            if !has_table(&conn, table)? {
                return Err(AppError::IndexUnavailable(format!(
                    "{} is not a knowledge index (missing '{}' table)",
                    path.display(),
                    table
                )));
            }
        }

        let meta = read_meta(&conn)?.ok_or_else(|| {
            AppError::IndexUnavailable(format!(
                "{} has no build metadata. Rebuild the index",
                path.display()
            ))
        })?;

        tracing::debug!(
            "Opened index {:?}: {} documents, {} dimensions",
            path,
            meta.documents,
            meta.dimensions
        );

        Ok(Self {
            path,
            conn: Mutex::new(conn),
            meta: Some(meta),
        })
    }

    /// Database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record build metadata.
    pub fn set_meta(&mut self, meta: IndexMeta) -> AppResult<()> {
        write_meta(&*self.lock()?, &meta)?;
        self.meta = Some(meta);
        Ok(())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index connection lock poisoned".to_string()))
    }
}

impl VectorIndex for SqliteIndex {
    fn add_documents(&mut self, documents: &[Document]) -> AppResult<()> {
        insert_documents(&mut *self.lock()?, documents)
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<(Document, f32)>> {
        query_documents(&*self.lock()?, query_embedding, top_k)
    }

    fn len(&self) -> AppResult<usize> {
        count_documents(&*self.lock()?)
    }

    fn reset(&mut self) -> AppResult<()> {
        reset_index(&*self.lock()?)?;
        self.meta = None;
        Ok(())
    }

    fn meta(&self) -> Option<&IndexMeta> {
        self.meta.as_ref()
    }
}
