//! Retrieval-augmented answering for the Knowledge Hub.
//!
//! A run retrieves context for a question, generates an answer, has the
//! model check it, and revises rejected answers a bounded number of times.

pub mod dispatch;
pub mod generator;
pub mod history;
pub mod orchestrator;
mod prompting;
pub mod refiner;
pub mod state;
pub mod validator;

#[cfg(test)]
mod tests;

pub use dispatch::{Dispatcher, Submission};
pub use generator::{render_history, AnswerGenerator};
pub use history::{EntryStatus, HistoryEntry, HistoryLog, PENDING_ANSWER};
pub use orchestrator::{decide_to_finish, Route, Workflow, WorkflowSettings, CONTEXT_SEPARATOR};
pub use refiner::ReflectionRefiner;
pub use state::{Turn, Validity, WorkflowOutcome, WorkflowState};
pub use validator::{AnswerValidator, CheckResult};
