//! Prompts command handler.

use clap::{Args, Subcommand};
use kbhub_core::{config::AppConfig, AppResult};
use kbhub_prompt::{list_prompts, PromptOrigin};

/// Inspect prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    #[command(subcommand)]
    pub action: PromptsAction,
}

#[derive(Subcommand, Debug)]
pub enum PromptsAction {
    /// List built-in prompts and workspace overrides
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            PromptsAction::List { json } => {
                let prompts = list_prompts(&config.workspace)?;

                if *json {
                    let output: Vec<_> = prompts
                        .iter()
                        .map(|(id, origin)| serde_json::json!({ "id": id, "origin": origin }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    for (id, origin) in &prompts {
                        let origin = match origin {
                            PromptOrigin::Builtin => "built-in",
                            PromptOrigin::Workspace => "workspace",
                        };
                        println!("{:<16} {}", id, origin);
                    }
                }
            }
        }

        Ok(())
    }
}
