//! Command handlers for the kbhub CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod history;
pub mod index;
pub mod prompts;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use history::HistoryCommand;
pub use index::IndexCommand;
pub use prompts::PromptsCommand;
