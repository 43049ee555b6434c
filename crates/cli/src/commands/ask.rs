//! Ask command handler.
//!
//! Runs the workflow once for a single question.

use clap::Args;
use kbhub_core::{config::AppConfig, AppResult};
use kbhub_workflow::{HistoryLog, Workflow};

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON (answer, validity, iterations, context)
    #[arg(long)]
    pub json: bool,

    /// Ignore earlier turns and do not record this one
    #[arg(long)]
    pub no_history: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let workflow = Workflow::from_config(config)?;

        let history = if self.no_history {
            None
        } else {
            Some(HistoryLog::open(&config.history_file())?)
        };

        let turns = history.as_ref().map(|h| h.turns()).unwrap_or_default();
        let id = history.as_ref().map(|h| h.begin(self.question.clone()));

        let result = workflow.run(&self.question, turns).await;

        if let (Some(history), Some(id)) = (&history, id) {
            let recorded = match &result {
                Ok(outcome) => history.complete(id, outcome),
                Err(e) => history.fail(id, e),
            };
            if let Err(e) = recorded {
                tracing::warn!("Failed to record history entry: {}", e);
            }
        }

        let outcome = result?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": outcome.answer,
                "validity": outcome.validity,
                "iterations": outcome.iterations,
                "context": outcome.context,
                "model": config.model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", outcome.answer);
            tracing::debug!(
                "Validity: {}, iterations: {}",
                outcome.validity,
                outcome.iterations
            );
        }

        Ok(())
    }
}
