//! Shared conversation log.
//!
//! Workers append a pending entry when a question arrives and resolve it when
//! the run ends. Every read and write goes through one mutex. Resolved entries
//! can be mirrored to a JSONL file so the conversation survives restarts.

use crate::state::{Turn, Validity, WorkflowOutcome};
use chrono::{DateTime, Utc};
use kbhub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shown in place of an answer while a run is in flight.
pub const PENDING_ANSWER: &str = "Thinking...";

/// Where an entry's run stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Answered {
        answer: String,
        validity: Validity,
        iterations: u32,
    },
    Failed {
        error: String,
    },
}

/// One question and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub question: String,
    pub asked_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl HistoryEntry {
    /// Text to show in the answer slot.
    pub fn display_answer(&self) -> String {
        match &self.status {
            EntryStatus::Pending => PENDING_ANSWER.to_string(),
            EntryStatus::Answered { answer, .. } => answer.clone(),
            EntryStatus::Failed { error } => format!("Error: {}", error),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, EntryStatus::Pending)
    }
}

#[derive(Debug, Default)]
struct HistoryInner {
    entries: Vec<HistoryEntry>,
    next_id: u64,
    file: Option<PathBuf>,
}

/// Cloneable handle to the process-wide history.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    inner: Arc<Mutex<HistoryInner>>,
}

impl HistoryLog {
    /// In-memory log with nothing persisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log backed by a JSONL file, loading any entries already recorded.
    ///
    /// Lines that do not parse are skipped with a warning.
    pub fn open(path: &Path) -> AppResult<Self> {
        let mut entries = Vec::new();

        if path.exists() {
            let contents = fs::read_to_string(path)?;
            for (line_no, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HistoryEntry>(line) {
                    Ok(entry) if !entry.is_pending() => entries.push(entry),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        "Skipping unreadable history line {} in {:?}: {}",
                        line_no + 1,
                        path,
                        e
                    ),
                }
            }
        }

        let next_id = entries.iter().map(|e| e.id + 1).max().unwrap_or(0);
        tracing::debug!("Loaded {} history entries from {:?}", entries.len(), path);

        Ok(Self {
            inner: Arc::new(Mutex::new(HistoryInner {
                entries,
                next_id,
                file: Some(path.to_path_buf()),
            })),
        })
    }

    /// Append a pending entry and return its id.
    pub fn begin(&self, question: impl Into<String>) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(HistoryEntry {
            id,
            question: question.into(),
            asked_at: Utc::now(),
            status: EntryStatus::Pending,
        });
        id
    }

    /// Record a finished run.
    pub fn complete(&self, id: u64, outcome: &WorkflowOutcome) -> AppResult<HistoryEntry> {
        self.resolve(
            id,
            EntryStatus::Answered {
                answer: outcome.answer.clone(),
                validity: outcome.validity,
                iterations: outcome.iterations,
            },
        )
    }

    /// Record an aborted run.
    pub fn fail(&self, id: u64, error: &AppError) -> AppResult<HistoryEntry> {
        self.resolve(
            id,
            EntryStatus::Failed {
                error: error.to_string(),
            },
        )
    }

    fn resolve(&self, id: u64, status: EntryStatus) -> AppResult<HistoryEntry> {
        let mut inner = self.lock();

        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::Other(format!("No history entry with id {}", id)))?;

        if !entry.is_pending() {
            return Err(AppError::Other(format!(
                "History entry {} is already resolved",
                id
            )));
        }

        entry.status = status;
        let resolved = entry.clone();

        if let Some(path) = &inner.file {
            append_line(path, &resolved)?;
        }

        Ok(resolved)
    }

    /// Copy of every entry, pending ones included, in arrival order.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.lock().entries.clone()
    }

    /// Answered exchanges only, in arrival order.
    pub fn turns(&self) -> Vec<Turn> {
        self.lock()
            .entries
            .iter()
            .filter_map(|e| match &e.status {
                EntryStatus::Answered { answer, .. } => Some(Turn::new(&e.question, answer)),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and truncate the backing file.
    pub fn clear(&self) -> AppResult<()> {
        let mut inner = self.lock();
        inner.entries.clear();
        if let Some(path) = &inner.file {
            if path.exists() {
                fs::write(path, "")?;
            }
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HistoryInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn append_line(path: &Path, entry: &HistoryEntry) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let line = serde_json::to_string(entry)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outcome(answer: &str) -> WorkflowOutcome {
        WorkflowOutcome {
            answer: answer.to_string(),
            context: String::new(),
            validity: Validity::Valid,
            iterations: 0,
        }
    }

    #[test]
    fn test_begin_is_pending() {
        let log = HistoryLog::new();
        let id = log.begin("What is sovereignty?");

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].display_answer(), PENDING_ANSWER);
        assert!(log.turns().is_empty());
    }

    #[test]
    fn test_turns_skip_pending_and_failed() {
        let log = HistoryLog::new();
        let a = log.begin("first");
        let b = log.begin("second");
        let _c = log.begin("third");

        log.complete(a, &outcome("one")).unwrap();
        log.fail(b, &AppError::ModelUnavailable("down".to_string()))
            .unwrap();

        assert_eq!(log.turns(), vec![Turn::new("first", "one")]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_failed_entry_display() {
        let log = HistoryLog::new();
        let id = log.begin("q");
        let entry = log
            .fail(id, &AppError::IndexUnavailable("no index".to_string()))
            .unwrap();
        assert_eq!(
            entry.display_answer(),
            "Error: Index unavailable: no index"
        );
    }

    #[test]
    fn test_resolve_twice_is_error() {
        let log = HistoryLog::new();
        let id = log.begin("q");
        log.complete(id, &outcome("a")).unwrap();
        assert!(log.complete(id, &outcome("b")).is_err());
        assert!(log.complete(99, &outcome("c")).is_err());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".kbhub/history.jsonl");

        {
            let log = HistoryLog::open(&path).unwrap();
            let a = log.begin("first");
            let b = log.begin("second");
            log.complete(a, &outcome("one")).unwrap();
            log.fail(b, &AppError::Other("boom".to_string())).unwrap();
            log.begin("never finished");
        }

        let reopened = HistoryLog::open(&path).unwrap();
        let entries = reopened.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(reopened.turns(), vec![Turn::new("first", "one")]);

        let next = reopened.begin("third");
        assert_eq!(next, 2);
    }

    #[test]
    fn test_open_skips_bad_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.jsonl");
        fs::write(
            &path,
            "not json\n{\"id\":4,\"question\":\"q\",\"asked_at\":\"2024-01-01T00:00:00Z\",\"status\":\"answered\",\"answer\":\"a\",\"validity\":\"valid\",\"iterations\":1}\n",
        )
        .unwrap();

        let log = HistoryLog::open(&path).unwrap();
        assert_eq!(log.turns(), vec![Turn::new("q", "a")]);
        assert_eq!(log.begin("next"), 5);
    }

    #[test]
    fn test_clear_truncates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("history.jsonl");

        let log = HistoryLog::open(&path).unwrap();
        let id = log.begin("q");
        log.complete(id, &outcome("a")).unwrap();
        assert!(fs::metadata(&path).unwrap().len() > 0);

        log.clear().unwrap();
        assert!(log.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_concurrent_begin_yields_unique_ids() {
        let log = HistoryLog::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = log.clone();
                std::thread::spawn(move || log.begin(format!("q{}", i)))
            })
            .collect();

        let mut ids: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
