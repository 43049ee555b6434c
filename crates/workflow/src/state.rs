//! Per-run workflow state.

use kbhub_llm::Verdict;
use serde::{Deserialize, Serialize};

/// Checker verdict on the current answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    /// Not checked yet
    #[default]
    Unset,
    Valid,
    Invalid,
}

impl From<Verdict> for Validity {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Validity::Valid,
            Verdict::Reject => Validity::Invalid,
        }
    }
}

impl std::fmt::Display for Validity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Validity::Unset => "unset",
            Validity::Valid => "valid",
            Validity::Invalid => "invalid",
        };
        f.write_str(s)
    }
}

/// A completed question/answer exchange from an earlier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

impl Turn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// State threaded through every node of a single run.
///
/// `question` and `history` are fixed at construction. `context` is written
/// once by retrieval; `answer` is replaced by each generation or reflection.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub question: String,
    pub context: String,
    pub answer: String,
    pub iterations: u32,
    pub validity: Validity,
    pub history: Vec<Turn>,
}

impl WorkflowState {
    pub fn new(question: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            question: question.into(),
            history,
            ..Default::default()
        }
    }
}

/// What a finished run reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub answer: String,
    pub context: String,
    pub validity: Validity,
    pub iterations: u32,
}

impl From<WorkflowState> for WorkflowOutcome {
    fn from(state: WorkflowState) -> Self {
        Self {
            answer: state.answer,
            context: state.context,
            validity: state.validity,
            iterations: state.iterations,
        }
    }
}
