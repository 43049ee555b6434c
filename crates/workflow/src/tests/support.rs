//! Shared fixtures for workflow scenario tests.

use crate::orchestrator::{Workflow, WorkflowSettings};
use async_trait::async_trait;
use kbhub_core::{AppError, AppResult};
use kbhub_knowledge::Retriever;
use kbhub_llm::StubClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Retriever returning a fixed document list, truncated to `k`.
pub struct FixedRetriever {
    documents: Vec<String>,
    calls: AtomicUsize,
}

impl FixedRetriever {
    pub fn new<I, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            documents: documents.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> AppResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}

/// Retriever whose index was never built.
pub struct MissingIndex;

#[async_trait]
impl Retriever for MissingIndex {
    async fn retrieve(&self, _query: &str, _k: usize) -> AppResult<Vec<String>> {
        Err(AppError::IndexUnavailable("index not built".to_string()))
    }
}

pub fn settings(max_iterations: u32) -> WorkflowSettings {
    WorkflowSettings {
        max_iterations,
        retrieve_docs_number: 4,
        model: "gen-model".to_string(),
        checker_model: "check-model".to_string(),
    }
}

/// Workflow over `retriever` and `stub` with built-in prompts.
pub fn workflow(
    retriever: Arc<dyn Retriever>,
    stub: Arc<StubClient>,
    max_iterations: u32,
) -> Workflow {
    let workspace = TempDir::new().unwrap();
    Workflow::with_client(retriever, stub, workspace.path(), settings(max_iterations)).unwrap()
}
