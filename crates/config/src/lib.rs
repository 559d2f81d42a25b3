//! Configuration loading, validation, and management for Corretor.
//!
//! Loads configuration from `~/.corretor/config.toml` (or the file named by
//! `CORRETOR_CONFIG`) with environment variable overrides. Every field has a
//! default, so a missing file is not an error. Validates all settings at
//! startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.corretor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API key (usually supplied through the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM endpoint and sampling settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Conversation history bounds
    #[serde(default)]
    pub history: HistoryConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Where listings data comes from when the model asks for it
    #[serde(default)]
    pub data_source: DataSourceConfig,

    /// Log file settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// System prompt settings
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("history", &self.history)
            .field("gateway", &self.gateway)
            .field("data_source", &self.data_source)
            .field("logging", &self.logging)
            .field("prompt", &self.prompt)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider label used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_provider_name() -> String {
    "openrouter".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "google/gemini-2.0-flash-lite-001".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum user/assistant pairs kept in memory and sent to the model
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
}

fn default_max_pairs() -> usize {
    3
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_pairs: default_max_pairs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Which data-fetch adapter to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    /// Google Sheets through the Composio action API
    Composio,
    /// A local text or CSV export of the sheet
    File,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_data_source_kind")]
    pub kind: DataSourceKind,

    /// Start the fetch in the background at the beginning of every turn
    #[serde(default)]
    pub prefetch: bool,

    #[serde(default)]
    pub composio: ComposioConfig,

    /// Path used when `kind = "file"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

fn default_data_source_kind() -> DataSourceKind {
    DataSourceKind::Composio
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            kind: default_data_source_kind(),
            prefetch: false,
            composio: ComposioConfig::default(),
            file_path: None,
        }
    }
}

impl std::fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("kind", &self.kind)
            .field("prefetch", &self.prefetch)
            .field("composio", &self.composio)
            .field("file_path", &self.file_path)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ComposioConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_composio_url")]
    pub base_url: String,

    #[serde(default = "default_composio_action")]
    pub action: String,

    #[serde(default = "default_entity_id")]
    pub entity_id: String,

    #[serde(default = "default_spreadsheet_id")]
    pub spreadsheet_id: String,

    #[serde(default = "default_ranges")]
    pub ranges: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_composio_timeout")]
    pub timeout_secs: u64,
}

fn default_composio_url() -> String {
    "https://backend.composio.dev/api/v2".into()
}
fn default_composio_action() -> String {
    "GOOGLESHEETS_BATCH_GET".into()
}
fn default_entity_id() -> String {
    "default".into()
}
fn default_spreadsheet_id() -> String {
    "1FS9Doruc2cIiQD7sFKNPHpx41JZJFp_dUAuc5LlyaGs".into()
}
fn default_ranges() -> Vec<String> {
    vec!["'Plan1'!A1:D6".into()]
}
fn default_composio_timeout() -> u64 {
    60
}

impl Default for ComposioConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_composio_url(),
            action: default_composio_action(),
            entity_id: default_entity_id(),
            spreadsheet_id: default_spreadsheet_id(),
            ranges: default_ranges(),
            timeout_secs: default_composio_timeout(),
        }
    }
}

impl std::fmt::Debug for ComposioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposioConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("action", &self.action)
            .field("entity_id", &self.entity_id)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("ranges", &self.ranges)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for `warnings_*.log` files
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Replace the built-in Portuguese listings prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

impl AppConfig {
    /// Load configuration from `$CORRETOR_CONFIG` or `~/.corretor/config.toml`.
    ///
    /// Environment variables take precedence over the file:
    /// - `CORRETOR_API_KEY`, then `OPENROUTER_API_KEY`, then `OPENAI_API_KEY`
    /// - `CORRETOR_MODEL`
    /// - `COMPOSIO_API_KEY`
    /// - `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CORRETOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`, which maps a variable
    /// name to its value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("CORRETOR_API_KEY")
            .or_else(|| lookup("OPENROUTER_API_KEY"))
            .or_else(|| lookup("OPENAI_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = lookup("CORRETOR_MODEL") {
            self.provider.model = model;
        }

        if let Some(key) = lookup("COMPOSIO_API_KEY") {
            self.data_source.composio.api_key = Some(key);
        }

        if let Some(port) = lookup("PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".corretor")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.model must not be empty".into(),
            ));
        }

        if self.history.max_pairs == 0 {
            return Err(ConfigError::ValidationError(
                "history.max_pairs must be at least 1".into(),
            ));
        }

        if self.data_source.kind == DataSourceKind::File && self.data_source.file_path.is_none() {
            return Err(ConfigError::ValidationError(
                "data_source.file_path is required when data_source.kind = \"file\"".into(),
            ));
        }

        Ok(())
    }

    /// Check if an LLM API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            history: HistoryConfig::default(),
            gateway: GatewayConfig::default(),
            data_source: DataSourceConfig::default(),
            logging: LoggingConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
