//! Reflection: rewriting an answer the checker rejected.

use crate::prompting::render_request;
use kbhub_core::AppResult;
use kbhub_llm::LlmClient;
use kbhub_prompt::PromptDefinition;
use std::sync::Arc;

/// Produces a revised answer from a rejected one.
///
/// The prompt asks for a clean answer without meta-commentary; the reply is
/// not filtered.
pub struct ReflectionRefiner {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
}

impl ReflectionRefiner {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
        }
    }

    pub async fn reflect(
        &self,
        question: &str,
        context: &str,
        failed_answer: &str,
    ) -> AppResult<String> {
        let request = render_request(
            &self.prompt,
            &[
                ("question", question),
                ("context", context),
                ("answer", failed_answer),
            ],
            &self.model,
        )?;

        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }
}
