//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use kbhub_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders both the system and user templates with Handlebars. Missing
/// variables render as empty strings.
///
/// # Example
/// ```no_run
/// use kbhub_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "kbhub.generate")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "When was the treaty signed?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?;

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(system: Option<&str>, template: &str) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            system: system.map(str::to_string),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_no_html_escaping() {
        let mut vars = HashMap::new();
        vars.insert("answer".to_string(), "A & B <c> \"d\"".to_string());

        let result = render_template("{{answer}}", &vars).unwrap();
        assert_eq!(result, "A & B <c> \"d\"");
    }

    #[test]
    fn test_build_prompt_with_system() {
        let def = definition(Some("Topic: {{topic}}"), "Q: {{question}}");
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), "history".to_string());
        vars.insert("question".to_string(), "Test question".to_string());

        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.system.as_deref(), Some("Topic: history"));
        assert_eq!(built.user, "Q: Test question");
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_missing_variable_renders_empty() {
        let def = definition(None, "History:\n{{history}}\nEnd");
        let built = build_prompt(&def, HashMap::new()).unwrap();
        assert_eq!(built.user, "History:\n\nEnd");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_broken_template_is_prompt_error() {
        let def = definition(None, "{{#if}}");
        let err = build_prompt(&def, HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Prompt(_)));
    }
}
