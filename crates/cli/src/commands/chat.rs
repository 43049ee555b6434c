//! Chat command handler.
//!
//! Each stdin line is a question handed to its own worker. Answers are
//! printed in completion order, which may differ from submission order.

use clap::Args;
use futures::stream::{FuturesUnordered, StreamExt};
use kbhub_core::{config::AppConfig, AppResult};
use kbhub_workflow::{Dispatcher, HistoryEntry, HistoryLog, Workflow, PENDING_ANSWER};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Answer questions read line by line from stdin
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Print each resolved entry as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Start from an empty conversation and do not persist it
    #[arg(long)]
    pub no_history: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let workflow = Arc::new(Workflow::from_config(config)?);
        let history = if self.no_history {
            HistoryLog::new()
        } else {
            HistoryLog::open(&config.history_file())?
        };
        let dispatcher = Dispatcher::new(workflow, history);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut running = FuturesUnordered::new();
        let mut input_open = true;

        while input_open || !running.is_empty() {
            tokio::select! {
                line = lines.next_line(), if input_open => {
                    match line? {
                        Some(line) => {
                            let question = line.trim();
                            if matches!(question, "exit" | "quit") {
                                input_open = false;
                            } else if !question.is_empty() {
                                let submission = dispatcher.submit(question);
                                if !self.json {
                                    println!("[{}] {}", submission.id, PENDING_ANSWER);
                                }
                                running.push(submission.handle);
                            }
                        }
                        None => input_open = false,
                    }
                }
                Some(joined) = running.next(), if !running.is_empty() => {
                    match joined {
                        Ok(entry) => self.print_entry(&entry)?,
                        Err(e) => tracing::error!("Worker task failed: {}", e),
                    }
                }
            }
        }

        tracing::info!("Answered {} questions", dispatcher.history().len());
        Ok(())
    }

    fn print_entry(&self, entry: &HistoryEntry) -> AppResult<()> {
        if self.json {
            println!("{}", serde_json::to_string(entry)?);
        } else {
            println!("[{}] Q: {}", entry.id, entry.question);
            println!("[{}] A: {}", entry.id, entry.display_answer());
        }
        Ok(())
    }
}
