//! Answer generation from retrieved context.

use crate::prompting::render_request;
use crate::state::Turn;
use kbhub_core::AppResult;
use kbhub_llm::LlmClient;
use kbhub_prompt::PromptDefinition;
use std::sync::Arc;

/// Writes a first answer from the question, context, and prior turns.
pub struct AnswerGenerator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
}

impl AnswerGenerator {
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

    /// Generate an answer. The reply is returned as-is, without validation.
    pub async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        history: &[Turn],
    ) -> AppResult<String> {
        let history = render_history(history);
        let request = render_request(
            &self.prompt,
            &[
                ("question", question),
                ("context", context),
                ("history", history.as_str()),
            ],
            &self.model,
        )?;

        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }
}

/// Render prior turns as `User:`/`Assistant:` lines; empty history renders as "".
pub fn render_history(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhub_llm::{StubCallKind, StubClient};
    use kbhub_prompt::{load_prompt, GENERATE_PROMPT_ID};
    use tempfile::TempDir;

    #[test]
    fn test_render_empty_history() {
        assert_eq!(render_history(&[]), "");
    }

    #[test]
    fn test_render_history_turns() {
        let history = vec![
            Turn::new("What is a tariff?", "A tax on imports."),
            Turn::new("Who sets it?", "Congress."),
        ];
        assert_eq!(
            render_history(&history),
            "User: What is a tariff?\nAssistant: A tax on imports.\nUser: Who sets it?\nAssistant: Congress."
        );
    }

    #[tokio::test]
    async fn test_generate_answer_sends_rendered_prompt() {
        let temp = TempDir::new().unwrap();
        let stub = Arc::new(StubClient::new().with_replies(["1921"]));
        let generator = AnswerGenerator::new(
            stub.clone(),
            load_prompt(temp.path(), GENERATE_PROMPT_ID).unwrap(),
            "test-model",
        );

        let answer = generator
            .generate_answer(
                "When was the treaty signed?",
                "Q: When was the treaty signed?\nA: 1921",
                &[Turn::new("Earlier question", "Earlier answer")],
            )
            .await
            .unwrap();
        assert_eq!(answer, "1921");

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, StubCallKind::Complete);
        let request = &calls[0].request;
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.0));
        assert!(request.prompt.contains("When was the treaty signed?"));
        assert!(request.prompt.contains("A: 1921"));
        assert!(request.prompt.contains("User: Earlier question\nAssistant: Earlier answer"));
        assert!(request.system.as_deref().unwrap_or("").contains("context"));
    }
}
