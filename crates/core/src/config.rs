//! Configuration management for the notebook.
//!
//! Configuration is assembled in layers, later layers winning:
//! - Built-in defaults
//! - The workspace config file (`.notebook/config.yaml`)
//! - Environment variables
//! - Programmatic overrides from the embedding host
//!
//! The configuration is workspace-centric: the shared store lives under
//! `.notebook/store` unless pointed elsewhere.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the answering service can be backed by.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "gemini"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .notebook/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory backing the shared key-value store
    pub store_dir: Option<PathBuf>,

    /// Answering service provider (e.g., "ollama", "gemini")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom provider endpoint
    pub endpoint: Option<String>,

    /// API key for the provider
    pub api_key: Option<String>,

    /// Transport timeout for answering requests, in seconds
    pub timeout_secs: u64,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Provider configurations from config.yaml
    pub llm: Option<LlmConfig>,

    /// User-facing notices and labels
    pub messages: MessagesConfig,

    /// Handlebars template overriding the default answer prompt
    pub prompt_template: Option<String>,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    Gemini {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Gemini { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Localizable notices and labels shown by the notebook view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct MessagesConfig {
    /// Shown when a draft lacks a name or a path
    pub missing_fields: String,

    /// Shown after a source was saved
    pub source_added: String,

    /// Asked before a source is deleted
    pub confirm_delete: String,

    /// Shown when the answering service fails
    pub query_failed: String,

    /// Label for a reference link without a title
    pub link_fallback: String,

    /// Header label when no source is active
    pub general_knowledge: String,

    /// Content synthesized for a source added without content.
    /// `{name}` is replaced by the source name.
    pub placeholder_content: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            missing_fields: "Please enter both a source name and a path.".to_string(),
            source_added: "The registry was updated and the new source was saved.".to_string(),
            confirm_delete: "Remove this source from the shared registry?".to_string(),
            query_failed: "The AI lookup failed. Please try again later.".to_string(),
            link_fallback: "Details".to_string(),
            general_knowledge: "Using general knowledge".to_string(),
            placeholder_content: "[Training data from {name}]".to_string(),
        }
    }
}

impl MessagesConfig {
    /// Placeholder content for a source that was added without any.
    pub fn placeholder_for(&self, name: &str) -> String {
        self.placeholder_content.replace("{name}", name)
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    messages: Option<MessagesConfig>,
    prompt: Option<PromptConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
    store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptConfig {
    template: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            store_dir: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            timeout_secs: 60,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            messages: MessagesConfig::default(),
            prompt_template: None,
        }
    }
}

/// Canonical provider name: trimmed, lowercased, with `google` folded into `gemini`.
pub fn canonical_provider(name: &str) -> String {
    let name = name.trim().to_lowercase();
    if name == "google" {
        "gemini".to_string()
    } else {
        name
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `NOTEBOOK_WORKSPACE`: Override workspace path
    /// - `NOTEBOOK_CONFIG`: Path to config file
    /// - `NOTEBOOK_PROVIDER`: Answering service provider
    /// - `NOTEBOOK_MODEL`: Model identifier
    /// - `NOTEBOOK_ENDPOINT`: Provider endpoint
    /// - `NOTEBOOK_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use notebook_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Store: {:?}", config.store_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("NOTEBOOK_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("NOTEBOOK_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.notebook_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("NOTEBOOK_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("NOTEBOOK_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("NOTEBOOK_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        config.api_key = std::env::var("NOTEBOOK_API_KEY").ok();
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

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

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
            if let Some(store) = ws.store {
                result.store_dir = Some(PathBuf::from(store));
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(messages) = config_file.messages {
            result.messages = messages;
        }

        if let Some(prompt) = config_file.prompt {
            result.prompt_template = prompt.template;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
                result.endpoint = provider_config.endpoint().map(str::to_string);
                if let ProviderConfig::Ollama {
                    timeout: Some(timeout),
                    ..
                } = provider_config
                {
                    result.timeout_secs = *timeout;
                }
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply host overrides to the configuration.
    ///
    /// Overrides take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

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

        self
    }

    /// Get the path to the .notebook directory.
    pub fn notebook_dir(&self) -> PathBuf {
        self.workspace.join(".notebook")
    }

    /// Directory backing the shared store.
    pub fn store_dir(&self) -> PathBuf {
        match self.store_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => self.workspace.join(dir),
            None => self.notebook_dir().join("store"),
        }
    }

    /// Active provider in canonical form.
    pub fn provider_name(&self) -> String {
        canonical_provider(&self.provider)
    }

    /// Get the configuration block for a provider, matching names canonically.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        let llm = self.llm.as_ref()?;
        llm.providers.get(provider).or_else(|| {
            let wanted = canonical_provider(provider);
            llm.providers
                .iter()
                .find(|(name, _)| canonical_provider(name) == wanted)
                .map(|(_, config)| config)
        })
    }

    /// Resolve the API key: `NOTEBOOK_API_KEY` first, then the provider's `apiKeyEnv`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::Gemini { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            _ => None,
        }
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider_name();

        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "Request timeout must be at least one second".to_string(),
            ));
        }

        if provider == "gemini" && self.resolve_api_key(&provider).is_none() {
            return Err(AppError::Config(
                "Gemini provider requires an API key (NOTEBOOK_API_KEY or apiKeyEnv)".to_string(),
            ));
        }

        Ok(())
    }
}
