//! Configuration management for the Knowledge Hub.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.kbhub/config.yaml`, or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! Every value is fixed for the lifetime of the process once loaded.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Chat providers understood by the language model factory.
pub const KNOWN_PROVIDERS: [&str; 3] = ["ollama", "openai", "stub"];

/// Embedding providers understood by the embedding factory.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["hashed", "ollama", "openai"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .kbhub/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider ("ollama", "openai", "stub")
    pub provider: String,

    /// Model used for generation and reflection
    pub model: String,

    /// Model used for answer checking (falls back to `model`)
    pub checker_model: Option<String>,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// API key for the chat and embedding providers
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Embedding provider ("hashed", "ollama", "openai")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding dimensions; provider default when unset
    pub embedding_dimensions: Option<usize>,

    /// Reflection bound; the loop stops once iterations exceed it
    pub max_iterations: u32,

    /// Number of documents passed to the retriever (`k`)
    pub retrieve_docs_number: usize,

    /// Index directory (relative paths resolve against the workspace)
    pub index_path: PathBuf,

    /// Question/answer CSV used to build the index
    pub dataset_path: PathBuf,

    /// HTTP request timeout for model and embedding calls
    pub request_timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embeddings: Option<EmbeddingsSection>,
    workflow: Option<WorkflowSection>,
    knowledge: Option<KnowledgeSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "checkerModel")]
    checker_model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "timeoutSecs")]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingsSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkflowSection {
    #[serde(rename = "maxIterations")]
    max_iterations: Option<u32>,
    #[serde(rename = "retrieveDocsNumber")]
    retrieve_docs_number: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct KnowledgeSection {
    #[serde(rename = "indexPath")]
    index_path: Option<PathBuf>,
    #[serde(rename = "datasetPath")]
    dataset_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            checker_model: None,
            endpoint: None,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            embedding_provider: "hashed".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dimensions: None,
            max_iterations: 1,
            retrieve_docs_number: 4,
            index_path: PathBuf::from(".kbhub/index"),
            dataset_path: PathBuf::from("data/rag_dataset.csv"),
            request_timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and the environment.
    ///
    /// Environment variables:
    /// - `KBHUB_WORKSPACE`, `KBHUB_CONFIG`
    /// - `KBHUB_PROVIDER`, `KBHUB_MODEL`, `KBHUB_CHECKER_MODEL`, `KBHUB_ENDPOINT`
    /// - `KBHUB_API_KEY` (or the variable named by `apiKeyEnv`, default `OPENAI_API_KEY`)
    /// - `KBHUB_EMBEDDING_PROVIDER`, `KBHUB_EMBEDDING_MODEL`
    /// - `KBHUB_MAX_ITERATIONS`, `KBHUB_RETRIEVE_DOCS_NUMBER`
    /// - `KBHUB_INDEX_PATH`, `KBHUB_DATASET_PATH`
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use kbhub_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {:?}", config.index_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit arguments win over `KBHUB_WORKSPACE` / `KBHUB_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("KBHUB_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("KBHUB_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.kbhub_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.merge_file(config_file))
    }

    fn merge_file(&self, file: ConfigFile) -> Self {
        let mut result = self.clone();

        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.checker_model.is_some() {
                result.checker_model = llm.checker_model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(api_key_env) = llm.api_key_env {
                result.api_key_env = api_key_env;
            }
            if let Some(timeout) = llm.timeout_secs {
                result.request_timeout_secs = timeout;
            }
        }

        if let Some(embeddings) = file.embeddings {
            if let Some(provider) = embeddings.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embeddings.model {
                result.embedding_model = model;
            }
            if embeddings.dimensions.is_some() {
                result.embedding_dimensions = embeddings.dimensions;
            }
        }

        if let Some(workflow) = file.workflow {
            if let Some(max_iterations) = workflow.max_iterations {
                result.max_iterations = max_iterations;
            }
            if let Some(k) = workflow.retrieve_docs_number {
                result.retrieve_docs_number = k;
            }
        }

        if let Some(knowledge) = file.knowledge {
            if let Some(index_path) = knowledge.index_path {
                result.index_path = index_path;
            }
            if let Some(dataset_path) = knowledge.dataset_path {
                result.dataset_path = dataset_path;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        result
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup("KBHUB_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = lookup("KBHUB_MODEL") {
            self.model = model;
        }
        if let Some(model) = lookup("KBHUB_CHECKER_MODEL") {
            self.checker_model = Some(model);
        }
        if let Some(endpoint) = lookup("KBHUB_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(provider) = lookup("KBHUB_EMBEDDING_PROVIDER") {
            self.embedding_provider = provider;
        }
        if let Some(model) = lookup("KBHUB_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(value) = lookup("KBHUB_MAX_ITERATIONS") {
            self.max_iterations = parse_env_number("KBHUB_MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = lookup("KBHUB_RETRIEVE_DOCS_NUMBER") {
            self.retrieve_docs_number = parse_env_number("KBHUB_RETRIEVE_DOCS_NUMBER", &value)?;
        }
        if let Some(path) = lookup("KBHUB_INDEX_PATH") {
            self.index_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("KBHUB_DATASET_PATH") {
            self.dataset_path = PathBuf::from(path);
        }

        self.api_key = lookup("KBHUB_API_KEY").or_else(|| lookup(&self.api_key_env));

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over every other source.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .kbhub directory.
    pub fn kbhub_dir(&self) -> PathBuf {
        self.workspace.join(".kbhub")
    }

    /// Ensure the .kbhub directory exists.
    pub fn ensure_kbhub_dir(&self) -> AppResult<()> {
        let dir = self.kbhub_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .kbhub directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolved index directory.
    pub fn index_dir(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    /// Resolved dataset file.
    pub fn dataset_file(&self) -> PathBuf {
        self.resolve(&self.dataset_path)
    }

    /// Conversation history log.
    pub fn history_file(&self) -> PathBuf {
        self.kbhub_dir().join("history.jsonl")
    }

    /// Model used by the answer checker.
    pub fn checker_model(&self) -> &str {
        self.checker_model.as_deref().unwrap_or(&self.model)
    }

    /// Embedding dimensions, falling back to the provider's usual size.
    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
            .unwrap_or(match self.embedding_provider.as_str() {
                "openai" => 1536,
                "ollama" => 768,
                _ => 384,
            })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate the configuration before any component is constructed.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.retrieve_docs_number == 0 {
            return Err(AppError::Config(
                "retrieveDocsNumber must be greater than zero".to_string(),
            ));
        }

        let needs_key = self.provider == "openai" || self.embedding_provider == "openai";
        if needs_key && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            )));
        }

        Ok(())
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        AppError::Config(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
