//! Prompt loader for YAML prompt definitions.

use crate::builtin::{builtin_yaml, BUILTIN_PROMPTS};
use crate::types::{PromptDefinition, PromptOrigin};
use kbhub_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Load a prompt definition by ID.
///
/// Looks for `.kbhub/prompts/<id>.yml` in the workspace first and falls
/// back to the built-in definition with the same id.
///
/// # Example
/// ```no_run
/// use kbhub_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "kbhub.generate")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    let (contents, origin) = if prompt_file.exists() {
        tracing::debug!("Loading prompt from: {:?}", prompt_file);
        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;
        (contents, PromptOrigin::Workspace)
    } else if let Some(yaml) = builtin_yaml(prompt_id) {
        (yaml.to_string(), PromptOrigin::Builtin)
    } else {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' not found (no built-in and no file at {:?})",
            prompt_id, prompt_file
        )));
    };

    let definition = parse_prompt(&contents)
        .map_err(|e| AppError::Prompt(format!("Prompt '{}': {}", prompt_id, e)))?;

    tracing::debug!(
        "Loaded prompt: {} ({}, {:?})",
        definition.id,
        definition.title,
        origin
    );

    Ok(definition)
}

/// List every available prompt id with where it comes from.
///
/// Workspace overrides of built-ins are reported as `Workspace`.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<(String, PromptOrigin)>> {
    let mut prompts: Vec<(String, PromptOrigin)> = BUILTIN_PROMPTS
        .iter()
        .map(|(id, _)| (id.to_string(), PromptOrigin::Builtin))
        .collect();

    let prompts_dir = prompts_dir(workspace_path);
    if prompts_dir.exists() {
        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    match prompts.iter_mut().find(|(id, _)| id == stem) {
                        Some(existing) => existing.1 = PromptOrigin::Workspace,
                        None => prompts.push((stem.to_string(), PromptOrigin::Workspace)),
                    }
                }
            }
        }
    }

    prompts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(prompts)
}

fn prompts_dir(workspace_path: &Path) -> PathBuf {
    workspace_path.join(".kbhub/prompts")
}

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    prompts_dir(workspace_path).join(format!("{}.yml", prompt_id))
}

fn parse_prompt(contents: &str) -> Result<PromptDefinition, String> {
    let definition: PromptDefinition =
        serde_yaml::from_str(contents).map_err(|e| format!("invalid YAML: {}", e))?;
    validate_prompt(&definition)?;
    Ok(definition)
}

fn validate_prompt(def: &PromptDefinition) -> Result<(), String> {
    if def.id.is_empty() {
        return Err("Prompt ID cannot be empty".to_string());
    }

    if def.title.is_empty() {
        return Err("Prompt title cannot be empty".to_string());
    }

    if def.template.trim().is_empty() {
        return Err("Prompt template cannot be empty".to_string());
    }

    if !def.api_version.contains('.') {
        return Err(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{CHECK_PROMPT_ID, GENERATE_PROMPT_ID, REFLECT_PROMPT_ID};
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, content: &str) {
        let prompts_dir = dir.join(".kbhub/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), content).unwrap();
    }

    #[test]
    fn test_builtins_load_and_validate() {
        let temp_dir = TempDir::new().unwrap();
        for id in [GENERATE_PROMPT_ID, CHECK_PROMPT_ID, REFLECT_PROMPT_ID] {
            let prompt = load_prompt(temp_dir.path(), id).unwrap();
            assert_eq!(prompt.id, id);
            assert!(prompt.system.is_some());
        }
    }

    #[test]
    fn test_workspace_override() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            GENERATE_PROMPT_ID,
            r#"
id: kbhub.generate
title: "Terse generator"
apiVersion: "1.1"
template: "Q: {{question}}"
"#,
        );

        let prompt = load_prompt(temp_dir.path(), GENERATE_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Terse generator");
        assert!(prompt.system.is_none());
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "invalid", "invalid: yaml: content:");

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_api_version() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "custom",
            "id: custom\ntitle: Custom\napiVersion: \"1\"\ntemplate: \"{{question}}\"\n",
        );

        let err = load_prompt(temp_dir.path(), "custom").unwrap_err();
        assert!(err.to_string().contains("apiVersion"));
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            "custom",
            "id: custom\ntitle: Custom\napiVersion: \"1.0\"\ntemplate: \"{{question}}\"\n",
        );
        write_prompt(
            temp_dir.path(),
            CHECK_PROMPT_ID,
            "id: kbhub.check\ntitle: Check\napiVersion: \"1.0\"\ntemplate: \"{{answer}}\"\n",
        );

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts.len(), 4);
        assert!(prompts.contains(&("custom".to_string(), PromptOrigin::Workspace)));
        assert!(prompts.contains(&(CHECK_PROMPT_ID.to_string(), PromptOrigin::Workspace)));
        assert!(prompts.contains(&(GENERATE_PROMPT_ID.to_string(), PromptOrigin::Builtin)));
    }
}
