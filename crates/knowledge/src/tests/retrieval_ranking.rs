//! Ranking behavior shared by the SQLite and in-memory indexes.

use crate::index::SqliteIndex;
use crate::types::Document;
use crate::vector_index::{MemoryIndex, VectorIndex};
use tempfile::TempDir;

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn corpus() -> Vec<Document> {
    [
        ("Q: What is habeas corpus?\nA: A writ against unlawful detention.", [1.0f32, 0.5, 0.2, 0.1]),
        ("Q: What caused the 2008 crisis?\nA: Subprime mortgage defaults.", [-0.3, -0.8, 0.4, -0.2]),
        ("Q: What is due process?\nA: Fair legal procedure.", [0.8, 0.6, 0.1, 0.0]),
        ("Q: Who was Bismarck?\nA: Prussian chancellor.", [0.0, 0.1, -0.9, 0.4]),
    ]
    .iter()
    .enumerate()
    .map(|(i, (text, emb))| Document {
        position: i as u32,
        text: text.to_string(),
        embedding: normalize(emb),
    })
    .collect()
}

fn assert_ranking(index: &dyn VectorIndex) {
    let query = normalize(&[0.9, 0.4, 0.3, 0.1]);

    let results = index.search(&query, 4).unwrap();
    assert_eq!(results.len(), 4);

    let positions: Vec<u32> = results.iter().map(|(d, _)| d.position).collect();
    assert_eq!(positions[0], 0, "closest legal document ranks first");
    assert_eq!(positions[1], 2);

    for pair in results.windows(2) {
        assert!(pair[0].1 >= pair[1].1, "scores must be non-increasing");
    }
    assert!(results[0].1 > 0.9);
    assert!(results[3].1 < 0.0);
}

#[test]
fn test_memory_index_ranking() {
    let mut index = MemoryIndex::new();
    index.add_documents(&corpus()).unwrap();
    assert_ranking(&index);
}

#[test]
fn test_sqlite_index_ranking() {
    let temp = TempDir::new().unwrap();
    let mut index = SqliteIndex::create(temp.path()).unwrap();
    index.add_documents(&corpus()).unwrap();
    assert_ranking(&index);
}

#[test]
fn test_indexes_agree() {
    let temp = TempDir::new().unwrap();
    let mut sqlite = SqliteIndex::create(temp.path()).unwrap();
    let mut memory = MemoryIndex::new();
    sqlite.add_documents(&corpus()).unwrap();
    memory.add_documents(&corpus()).unwrap();

    let query = normalize(&[0.1, 0.2, -0.5, 0.3]);
    let from_sqlite: Vec<u32> = sqlite
        .search(&query, 3)
        .unwrap()
        .iter()
        .map(|(d, _)| d.position)
        .collect();
    let from_memory: Vec<u32> = memory
        .search(&query, 3)
        .unwrap()
        .iter()
        .map(|(d, _)| d.position)
        .collect();

    assert_eq!(from_sqlite, from_memory);
}

#[test]
fn test_top_k_truncates() {
    let mut index = MemoryIndex::new();
    index.add_documents(&corpus()).unwrap();

    let results = index.search(&normalize(&[1.0, 0.0, 0.0, 0.0]), 1).unwrap();
    assert_eq!(results.len(), 1);
}
