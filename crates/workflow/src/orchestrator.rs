//! The retrieve → generate → check → reflect state machine.
//!
//! ```text
//! Retrieve ─► Generate ─► Check ─┬─ valid ──────────────────────► done
//!                          ▲     ├─ invalid, iterations > max ──► done (forced stop)
//!                          │     └─ invalid, iterations ≤ max ──► Reflect
//!                          └──────────────────────────────────────────┘
//! ```

use crate::generator::AnswerGenerator;
use crate::refiner::ReflectionRefiner;
use crate::state::{Turn, Validity, WorkflowOutcome, WorkflowState};
use crate::validator::AnswerValidator;
use kbhub_core::{AppConfig, AppResult};
use kbhub_knowledge::{create_provider, EmbeddingConfig, Retriever, VectorRetriever};
use kbhub_llm::{create_client, LlmClient};
use kbhub_prompt::{load_prompt, CHECK_PROMPT_ID, GENERATE_PROMPT_ID, REFLECT_PROMPT_ID};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Documents in the context are separated by a blank line.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Run-wide knobs, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Reflection budget; a run reflects at most `max_iterations + 1` times
    pub max_iterations: u32,

    /// Documents retrieved per question
    pub retrieve_docs_number: usize,

    /// Model used for generation and reflection
    pub model: String,

    /// Model used for checking
    pub checker_model: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1,
            retrieve_docs_number: 4,
            model: "llama3.2".to_string(),
            checker_model: "llama3.2".to_string(),
        }
    }
}

impl WorkflowSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            retrieve_docs_number: config.retrieve_docs_number,
            model: config.model.clone(),
            checker_model: config.checker_model().to_string(),
        }
    }
}

/// Where to go after a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Finish,
    Reflect,
}

/// Route after a check: finish on a valid answer or an exhausted budget.
///
/// The budget test is strictly greater-than, so an always-rejected run
/// reflects `max_iterations + 1` times before stopping.
pub fn decide_to_finish(state: &WorkflowState, max_iterations: u32) -> Route {
    if state.validity == Validity::Valid || state.iterations > max_iterations {
        Route::Finish
    } else {
        Route::Reflect
    }
}

/// One configured pipeline, shared by every run in the process.
pub struct Workflow {
    retriever: Arc<dyn Retriever>,
    generator: AnswerGenerator,
    validator: AnswerValidator,
    refiner: ReflectionRefiner,
    settings: WorkflowSettings,
}

impl Workflow {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: AnswerGenerator,
        validator: AnswerValidator,
        refiner: ReflectionRefiner,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            retriever,
            generator,
            validator,
            refiner,
            settings,
        }
    }

    /// Build all three nodes on one client, loading prompts from `workspace`.
    pub fn with_client(
        retriever: Arc<dyn Retriever>,
        client: Arc<dyn LlmClient>,
        workspace: &Path,
        settings: WorkflowSettings,
    ) -> AppResult<Self> {
        let generator = AnswerGenerator::new(
            client.clone(),
            load_prompt(workspace, GENERATE_PROMPT_ID)?,
            settings.model.clone(),
        );
        let validator = AnswerValidator::new(
            client.clone(),
            load_prompt(workspace, CHECK_PROMPT_ID)?,
            settings.checker_model.clone(),
        );
        let refiner = ReflectionRefiner::new(
            client,
            load_prompt(workspace, REFLECT_PROMPT_ID)?,
            settings.model.clone(),
        );

        Ok(Self::new(retriever, generator, validator, refiner, settings))
    }

    /// Build the live pipeline described by `config`.
    ///
    /// Fails with `IndexUnavailable` when the index has not been built.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let client = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        let embedder = create_provider(&EmbeddingConfig::from_app_config(config))?;
        let retriever = VectorRetriever::open(&config.index_dir(), embedder)?;

        tracing::debug!(
            provider = client.provider_name(),
            model = %config.model,
            checker_model = config.checker_model(),
            max_iterations = config.max_iterations,
            k = config.retrieve_docs_number,
            "Workflow configured"
        );

        Self::with_client(
            Arc::new(retriever),
            client,
            &config.workspace,
            WorkflowSettings::from_config(config),
        )
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Answer one question.
    ///
    /// Any node failure aborts the run and is returned as-is. A forced stop
    /// is a success whose validity is still `Invalid`.
    #[instrument(skip(self, question, history), fields(history_turns = history.len()))]
    pub async fn run(&self, question: &str, history: Vec<Turn>) -> AppResult<WorkflowOutcome> {
        let mut state = WorkflowState::new(question, history);

        self.retrieve_context(&mut state).await?;
        self.generate_answer(&mut state).await?;

        loop {
            self.check_answer(&mut state).await?;
            match decide_to_finish(&state, self.settings.max_iterations) {
                Route::Finish => break,
                Route::Reflect => self.reflect_and_retry(&mut state).await?,
            }
        }

        tracing::info!(
            validity = %state.validity,
            iterations = state.iterations,
            "Workflow finished"
        );

        Ok(state.into())
    }

    #[instrument(skip_all, name = "retrieve")]
    async fn retrieve_context(&self, state: &mut WorkflowState) -> AppResult<()> {
        state.iterations = 0;
        let documents = self
            .retriever
            .retrieve(&state.question, self.settings.retrieve_docs_number)
            .await?;

        tracing::info!(documents = documents.len(), "Context retrieved");
        state.context = documents.join(CONTEXT_SEPARATOR);
        Ok(())
    }

    #[instrument(skip_all, name = "generate")]
    async fn generate_answer(&self, state: &mut WorkflowState) -> AppResult<()> {
        state.answer = self
            .generator
            .generate_answer(&state.question, &state.context, &state.history)
            .await?;

        tracing::info!(answer_len = state.answer.len(), "Answer generated");
        Ok(())
    }

    #[instrument(skip_all, name = "check", fields(iterations = state.iterations))]
    async fn check_answer(&self, state: &mut WorkflowState) -> AppResult<()> {
        let result = self
            .validator
            .check_answer(&state.question, &state.context, &state.answer)
            .await?;

        tracing::info!(validity = %result.validity, "Answer checked");
        tracing::debug!(reasoning = %result.reasoning, "Checker reasoning");
        state.validity = result.validity;
        Ok(())
    }

    #[instrument(skip_all, name = "reflect", fields(iterations = state.iterations))]
    async fn reflect_and_retry(&self, state: &mut WorkflowState) -> AppResult<()> {
        state.iterations += 1;
        state.answer = self
            .refiner
            .reflect(&state.question, &state.context, &state.answer)
            .await?;

        tracing::info!(iterations = state.iterations, "Answer revised");
        Ok(())
    }
}
