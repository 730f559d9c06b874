//! Application configuration module
//!
//! Loading, validating and saving of `conf.json`, and construction of the concrete
//! collaborators (content store, translation backend) it describes.

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::content::RestContentStore;
use crate::http_client::{RetryPolicy, RetryingHttpClient};
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::TranslationBackend;
use crate::sync::SyncOptions;
use crate::translation::TranslationOptions;

/// Environment variable consulted when `store.api_token` is empty
pub const STORE_TOKEN_ENV: &str = "LOCSYNC_STORE_TOKEN";

/// Environment variable consulted when the active provider has no `api_key`
pub const API_KEY_ENV: &str = "LOCSYNC_API_KEY";

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Site whose locales are synced
    pub site_id: String,

    /// Content branch to read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Content store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Locale scheduling
    #[serde(default)]
    pub sync: SyncConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Content store connection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the content API
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Bearer token; falls back to `LOCSYNC_STORE_TOKEN`
    #[serde(default = "String::new")]
    pub api_token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            api_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Anthropic messages API
    Anthropic,
}

impl TranslationProvider {
    /// Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        match provider_type {
            TranslationProvider::Ollama => Self {
                provider_type: "ollama".to_string(),
                model: default_ollama_model(),
                api_key: String::new(),
                endpoint: default_ollama_endpoint(),
                timeout_secs: default_timeout_secs(),
            },
            TranslationProvider::Anthropic => Self {
                provider_type: "anthropic".to_string(),
                model: default_anthropic_model(),
                api_key: String::new(),
                endpoint: default_anthropic_endpoint(),
                timeout_secs: default_anthropic_timeout_secs(),
            },
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Locale scheduling settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Locales processed concurrently within one group
    #[serde(default = "default_locale_concurrency")]
    pub locale_concurrency: usize,

    /// Unique strings per translation batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            locale_concurrency: default_locale_concurrency(),
            batch_size: default_batch_size(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_store_endpoint() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_anthropic_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_locale_concurrency() -> usize {
    3
}

fn default_batch_size() -> usize {
    20
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional website translator. Translate the following text from {source_language} to {target_language}. Keep the tone, punctuation and any placeholders intact. Reply with the translation only.".to_string()
}

fn env_fallback(value: &str, variable: &str) -> String {
    if !value.is_empty() {
        return value.to_string();
    }
    std::env::var(variable).unwrap_or_default()
}

impl Config {
    /// Configuration for a site with every other setting defaulted
    pub fn for_site(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            ..Self::default()
        }
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load a configuration file, writing a default one first when missing.
    ///
    /// Returns the configuration and whether it was just created.
    pub fn load_or_create(path: &Path) -> Result<(Self, bool)> {
        if path.exists() {
            return Ok((Self::load(path)?, false));
        }
        let config = Self::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.site_id.trim().is_empty() {
            return Err(anyhow!("site_id is required"));
        }

        url::Url::parse(&self.store.endpoint)
            .with_context(|| format!("Invalid store endpoint: {}", self.store.endpoint))?;
        if self.store_token().is_empty() {
            return Err(anyhow!("Content store token is required (store.api_token or {})", STORE_TOKEN_ENV));
        }

        if self.sync.locale_concurrency == 0 {
            return Err(anyhow!("sync.locale_concurrency must be at least 1"));
        }
        if self.sync.batch_size == 0 {
            return Err(anyhow!("sync.batch_size must be at least 1"));
        }

        let temperature = self.translation.common.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(anyhow!("Temperature must be between 0.0 and 1.0, got {}", temperature));
        }

        if self.translation.provider == TranslationProvider::Anthropic && self.translation.get_api_key().is_empty() {
            return Err(anyhow!("Translation API key is required for Anthropic provider (api_key or {})", API_KEY_ENV));
        }

        Ok(())
    }

    /// Store token from the file, or from the environment
    pub fn store_token(&self) -> String {
        env_fallback(&self.store.api_token, STORE_TOKEN_ENV)
    }

    /// Retry policy shared by every outbound client
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.translation.common.retry_count,
            backoff_base_ms: self.translation.common.retry_backoff_ms,
            ..RetryPolicy::default()
        }
    }

    /// Build the REST content store described by `store`
    pub fn build_store(&self) -> Result<RestContentStore> {
        let client = RetryingHttpClient::new(Duration::from_secs(self.store.timeout_secs), self.retry_policy());
        Ok(RestContentStore::new(client, &self.store.endpoint, self.store_token())?)
    }

    /// Build the active translation backend
    pub fn build_backend(&self) -> Arc<dyn TranslationBackend> {
        let translation = &self.translation;
        let client = RetryingHttpClient::new(Duration::from_secs(translation.get_timeout_secs()), self.retry_policy());
        let common = &translation.common;
        match translation.provider {
            TranslationProvider::Ollama => Arc::new(
                Ollama::new(client, translation.get_endpoint(), translation.get_model())
                    .with_temperature(common.temperature)
                    .with_system_prompt(common.system_prompt.clone()),
            ),
            TranslationProvider::Anthropic => Arc::new(
                Anthropic::new(client, translation.get_api_key(), translation.get_endpoint(), translation.get_model())
                    .with_temperature(common.temperature)
                    .with_system_prompt(common.system_prompt.clone()),
            ),
        }
    }

    /// Options for the translation service
    pub fn translation_options(&self) -> TranslationOptions {
        TranslationOptions {
            batch_size: self.sync.batch_size,
            ..TranslationOptions::default()
        }
    }

    /// Options for the locale orchestrator
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            locale_concurrency: self.sync.locale_concurrency,
            branch: self.branch.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site_id: String::new(),
            branch: None,
            store: StoreConfig::default(),
            translation: TranslationConfig::default(),
            sync: SyncConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => ProviderConfig::new(self.provider).model,
        }
    }

    /// Get the API key for the active provider, falling back to `LOCSYNC_API_KEY`
    pub fn get_api_key(&self) -> String {
        let configured = self
            .get_active_provider_config()
            .map(|p| p.api_key.as_str())
            .unwrap_or_default();
        env_fallback(configured, API_KEY_ENV)
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => ProviderConfig::new(self.provider).endpoint,
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => ProviderConfig::new(self.provider).timeout_secs,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::Anthropic),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
