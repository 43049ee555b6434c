//! History command handler.

use clap::{Args, Subcommand};
use kbhub_core::{config::AppConfig, AppResult};
use kbhub_workflow::HistoryLog;

/// Show or clear the conversation history
#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Print recorded exchanges
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every recorded exchange
    Clear,
}

impl HistoryCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let history = HistoryLog::open(&config.history_file())?;

        match &self.action {
            HistoryAction::Show { json } => {
                let entries = history.snapshot();
                if *json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else if entries.is_empty() {
                    println!("No history recorded");
                } else {
                    for entry in &entries {
                        println!("[{}] {}", entry.id, entry.asked_at.format("%Y-%m-%d %H:%M:%S"));
                        println!("User: {}", entry.question);
                        println!("Assistant: {}", entry.display_answer());
                        println!();
                    }
                }
            }
            HistoryAction::Clear => {
                let count = history.len();
                history.clear()?;
                tracing::info!("Cleared {} history entries", count);
                println!("History cleared ({} entries)", count);
            }
        }

        Ok(())
    }
}
