//! Answer checking against the retrieved context.

use crate::prompting::render_request;
use crate::state::Validity;
use kbhub_core::AppResult;
use kbhub_llm::LlmClient;
use kbhub_prompt::PromptDefinition;
use std::sync::Arc;

/// Checker verdict with its rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub validity: Validity,
    pub reasoning: String,
}

/// Asks the model whether an answer is supported by the context.
pub struct AnswerValidator {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
}

impl AnswerValidator {
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

    /// Check an answer. A reply without a readable `Y`/`N` decision is
    /// `ModelMalformedOutput`; there is no fallback verdict.
    pub async fn check_answer(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> AppResult<CheckResult> {
        let request = render_request(
            &self.prompt,
            &[
                ("question", question),
                ("context", context),
                ("answer", answer),
            ],
            &self.model,
        )?;

        let decision = self.client.decide(&request).await?;

        Ok(CheckResult {
            validity: decision.decision.into(),
            reasoning: decision.reasoning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbhub_core::AppError;
    use kbhub_llm::{StubCallKind, StubClient};
    use kbhub_prompt::{load_prompt, CHECK_PROMPT_ID};
    use tempfile::TempDir;

    fn validator(stub: Arc<StubClient>) -> AnswerValidator {
        let temp = TempDir::new().unwrap();
        AnswerValidator::new(
            stub,
            load_prompt(temp.path(), CHECK_PROMPT_ID).unwrap(),
            "checker-model",
        )
    }

    #[tokio::test]
    async fn test_accept() {
        let stub = Arc::new(StubClient::new().always_accept());
        let result = validator(stub.clone())
            .check_answer("q", "ctx", "a")
            .await
            .unwrap();

        assert_eq!(result.validity, Validity::Valid);
        assert_eq!(result.reasoning, "Supported by the context");

        let calls = stub.calls();
        assert_eq!(calls[0].kind, StubCallKind::Decide);
        assert_eq!(calls[0].request.model, "checker-model");
        assert!(calls[0].request.prompt.contains("ctx"));
    }

    #[tokio::test]
    async fn test_default_stub_rejects() {
        let stub = Arc::new(StubClient::new());
        let result = validator(stub).check_answer("q", "ctx", "a").await.unwrap();
        assert_eq!(result.validity, Validity::Invalid);
        assert_eq!(result.reasoning, "Fake checking response");
    }

    #[tokio::test]
    async fn test_unreadable_decision_is_malformed() {
        let stub = Arc::new(StubClient::new().with_raw_decisions(["maybe?"]));
        let err = validator(stub).check_answer("q", "ctx", "a").await.unwrap_err();
        assert!(matches!(err, AppError::ModelMalformedOutput(_)));
    }
}
