//! Prompt system for the Knowledge Hub.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in generator, checker, and reflection prompts
//! - Workspace overrides under `.kbhub/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod builtin;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use builtin::{CHECK_PROMPT_ID, GENERATE_PROMPT_ID, REFLECT_PROMPT_ID};
pub use loader::{list_prompts, load_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOrigin};
