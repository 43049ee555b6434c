//! Rendering prompt definitions into LLM requests.

use kbhub_core::AppResult;
use kbhub_llm::LlmRequest;
use kbhub_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;

/// Render `definition` with `variables` into a deterministic request for `model`.
pub(crate) fn render_request(
    definition: &PromptDefinition,
    variables: &[(&str, &str)],
    model: &str,
) -> AppResult<LlmRequest> {
    let variables: HashMap<String, String> = variables
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let built = build_prompt(definition, variables)?;

    tracing::debug!(
        prompt = %built.metadata.source_prompt_id,
        system_len = built.system.as_ref().map_or(0, String::len),
        user_len = built.user.len(),
        "Rendered prompt"
    );

    let mut request = LlmRequest::new(built.user, model).with_temperature(0.0);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }
    Ok(request)
}
