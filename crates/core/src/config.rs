//! Configuration management for kbchat.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`.kbchat/config.yaml` in the workspace, or an explicit path)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the generator factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["bedrock", "ollama"];

/// Prefixes of cross-region inference-profile ids.
const INFERENCE_PROFILE_PREFIXES: [&str; 4] = ["us.", "eu.", "apac.", "global."];

fn is_inference_profile(model: &str) -> bool {
    INFERENCE_PROFILE_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_MODEL: &str = "us.anthropic.claude-3-7-sonnet-20250219-v1:0";
const DEFAULT_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .kbchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Cloud region used to derive default endpoints and model ARNs
    pub region: String,

    /// Generation provider ("bedrock" or "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// Bearer token for the model invoke API. Knowledge base calls are SigV4-signed.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON
    pub log_json: bool,

    pub generation: GenerationConfig,
    pub endpoints: EndpointConfig,
    pub retrieval: RetrievalConfig,
    pub catalog: CatalogConfig,

    /// Per-request HTTP timeout in seconds
    pub timeout_secs: u64,
}

/// Generation request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub anthropic_version: String,
    pub temperature: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            temperature: None,
        }
    }
}

/// Endpoint overrides. Unset endpoints are derived from the region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointConfig {
    /// Model invocation endpoint
    pub runtime: Option<String>,
    /// Knowledge base retrieval endpoint
    pub agent_runtime: Option<String>,
    /// Knowledge base catalog endpoint
    pub agent: Option<String>,
    /// Local Ollama endpoint
    pub ollama: Option<String>,
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Number of passages requested from the retriever (backend default if unset)
    pub number_of_results: Option<u32>,

    /// Model ARN used by the composite retrieve-and-generate call
    pub model_arn: Option<String>,

    /// Whether the composite retrieve-and-generate strategy is available
    pub composite: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            number_of_results: None,
            model_arn: None,
            composite: true,
        }
    }
}

/// Knowledge base catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    pub max_results: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { max_results: 20 }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    region: Option<String>,
    provider: Option<String>,
    model: Option<String>,
    generation: Option<GenerationConfig>,
    endpoints: Option<EndpointConfig>,
    retrieval: Option<RetrievalConfig>,
    catalog: Option<CatalogConfig>,
    http: Option<HttpConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpConfig {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            region: DEFAULT_REGION.to_string(),
            provider: "bedrock".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            generation: GenerationConfig::default(),
            endpoints: EndpointConfig::default(),
            retrieval: RetrievalConfig::default(),
            catalog: CatalogConfig::default(),
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `KBCHAT_WORKSPACE`: Override workspace path
    /// - `KBCHAT_CONFIG`: Path to config file
    /// - `KBCHAT_PROVIDER`: Generation provider
    /// - `KBCHAT_MODEL`: Model identifier
    /// - `KBCHAT_API_KEY` / `AWS_BEARER_TOKEN_BEDROCK`: Bearer token
    /// - `AWS_REGION`: Region
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use kbchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Region: {}", config.region);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// Explicit arguments win over `KBCHAT_WORKSPACE` and `KBCHAT_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("KBCHAT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("KBCHAT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.kbchat_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override the config file
        if let Ok(region) = std::env::var("AWS_REGION") {
            config.region = region;
        }

        if let Ok(provider) = std::env::var("KBCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("KBCHAT_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("KBCHAT_API_KEY")
            .or_else(|_| std::env::var("AWS_BEARER_TOKEN_BEDROCK"))
            .ok();

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

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);

        let mut result = self.clone();

        if let Some(region) = file.region {
            result.region = region;
        }
        if let Some(provider) = file.provider {
            result.provider = provider;
        }
        if let Some(model) = file.model {
            result.model = model;
        }
        if let Some(generation) = file.generation {
            result.generation = generation;
        }
        if let Some(endpoints) = file.endpoints {
            result.endpoints = endpoints;
        }
        if let Some(retrieval) = file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(catalog) = file.catalog {
            result.catalog = catalog;
        }
        if let Some(timeout) = file.http.and_then(|h| h.timeout_secs) {
            result.timeout_secs = timeout;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        region: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(region) = region {
            self.region = region;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .kbchat directory.
    pub fn kbchat_dir(&self) -> PathBuf {
        self.workspace.join(".kbchat")
    }

    /// Model invocation endpoint.
    pub fn runtime_endpoint(&self) -> String {
        self.endpoints
            .runtime
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region))
    }

    /// Knowledge base retrieval endpoint.
    pub fn agent_runtime_endpoint(&self) -> String {
        self.endpoints.agent_runtime.clone().unwrap_or_else(|| {
            format!("https://bedrock-agent-runtime.{}.amazonaws.com", self.region)
        })
    }

    /// Knowledge base catalog endpoint.
    pub fn agent_endpoint(&self) -> String {
        self.endpoints
            .agent
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-agent.{}.amazonaws.com", self.region))
    }

    /// Local Ollama endpoint.
    pub fn ollama_endpoint(&self) -> String {
        self.endpoints
            .ollama
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string())
    }

    /// Endpoint for the active generation provider.
    pub fn generation_endpoint(&self) -> String {
        match self.provider.as_str() {
            "ollama" => self.ollama_endpoint(),
            _ => self.runtime_endpoint(),
        }
    }

    /// Model ARN used by the composite retrieve-and-generate call.
    ///
    /// Inference-profile ids and full ARNs are accepted by the service as-is;
    /// only plain foundation-model ids are expanded into an ARN.
    pub fn model_arn(&self) -> String {
        if let Some(arn) = &self.retrieval.model_arn {
            return arn.clone();
        }

        let model = self.model.trim();
        if model.starts_with("arn:") || is_inference_profile(model) {
            return model.to_string();
        }

        format!(
            "arn:aws:bedrock:{}::foundation-model/{}",
            self.region, model
        )
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if self.generation.max_tokens == 0 {
            return Err(AppError::Config(
                "generation.maxTokens must be greater than zero".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(AppError::Config(
                "http.timeoutSecs must be greater than zero".to_string(),
            ));
        }

        for endpoint in [
            self.generation_endpoint(),
            self.agent_runtime_endpoint(),
            self.agent_endpoint(),
        ] {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "Endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        Ok(())
    }
}
