//! One worker task per question.

use crate::history::{EntryStatus, HistoryEntry, HistoryLog};
use crate::orchestrator::Workflow;
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Runs each submitted question on its own tokio task.
///
/// Workers share only the history log. Each run sees the answered turns that
/// existed when it was submitted.
#[derive(Clone)]
pub struct Dispatcher {
    workflow: Arc<Workflow>,
    history: HistoryLog,
}

/// A question that has been accepted for processing.
#[derive(Debug)]
pub struct Submission {
    /// History entry id
    pub id: u64,

    /// Resolves to the finished entry
    pub handle: JoinHandle<HistoryEntry>,
}

impl Dispatcher {
    pub fn new(workflow: Arc<Workflow>, history: HistoryLog) -> Self {
        Self { workflow, history }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Record the question as pending and start a worker for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, question: impl Into<String>) -> Submission {
        let question = question.into();
        let turns = self.history.turns();
        let id = self.history.begin(question.clone());

        let workflow = Arc::clone(&self.workflow);
        let history = self.history.clone();

        let handle = tokio::spawn(async move {
            let result = workflow
                .run(&question, turns)
                .instrument(tracing::info_span!("worker", id))
                .await;

            let resolved = match result {
                Ok(outcome) => history.complete(id, &outcome),
                Err(e) => {
                    tracing::error!(id, "Run failed: {}", e);
                    history.fail(id, &e)
                }
            };

            match resolved {
                Ok(entry) => entry,
                // The in-memory entry is updated even when persisting it fails
                Err(e) => {
                    tracing::warn!(id, "Failed to record history entry: {}", e);
                    history
                        .snapshot()
                        .into_iter()
                        .find(|entry| entry.id == id)
                        .unwrap_or_else(|| HistoryEntry {
                            id,
                            question,
                            asked_at: Utc::now(),
                            status: EntryStatus::Failed {
                                error: e.to_string(),
                            },
                        })
                }
            }
        });

        tracing::debug!(id, "Question submitted");
        Submission { id, handle }
    }
}
