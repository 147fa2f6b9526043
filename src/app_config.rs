use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::subtitle_processor::TextEncoding;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the subtitle text (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language of the translation block (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Which blocks to emit and how to style them
    #[serde(default)]
    pub markup: MarkupConfig,

    /// Reading lexicon settings
    #[serde(default)]
    pub tokenizer: TokenizerConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    #[default]
    Ollama,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Whether the hosted API needs a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic)
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
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
        }
    }

    /// Parsed provider type, if recognized
    pub fn provider(&self) -> Option<TranslationProvider> {
        self.provider_type.parse().ok()
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

    /// Upper bound for a single line translation, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Reuse translations of identical lines within a run
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cached lines kept before the oldest is evicted
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            cache_enabled: true,
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

/// Markup blocks and styling
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarkupConfig {
    /// Emit furigana above each line
    #[serde(default = "default_true")]
    pub furigana: bool,

    /// Emit a romanized line
    #[serde(default)]
    pub romaji: bool,

    /// Emit a translated line
    #[serde(default)]
    pub translation: bool,

    /// Font size of the original text; sub-blocks are scaled from it
    #[serde(default = "default_base_font_size")]
    pub base_font_size: u32,

    /// Font family for the whole cue
    #[serde(default = "default_font_name")]
    pub font_name: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            furigana: true,
            romaji: false,
            translation: false,
            base_font_size: default_base_font_size(),
            font_name: default_font_name(),
        }
    }
}

/// Tokenizer configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TokenizerConfig {
    /// Tab-separated `surface<TAB>reading` lexicon
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
}

/// Output file configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct OutputConfig {
    /// Text encoding of written subtitle files
    #[serde(default)]
    pub encoding: TextEncoding,

    /// Extension for generated file names (defaults to the input's)
    #[serde(default)]
    pub extension: Option<String>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_base_font_size() -> u32 {
    20
}

fn default_font_name() -> String {
    "Noto Sans JP".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    crate::translation::DEFAULT_MAX_ENTRIES
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_endpoint(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

fn default_model(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "llama3.2:3b".to_string(),
        TranslationProvider::OpenAI => "gpt-4o-mini".to_string(),
        TranslationProvider::Anthropic => "claude-3-haiku-20240307".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model".to_string(),
    }
}

fn default_system_prompt() -> String {
    "You are a professional subtitle translator. Translate the following subtitle line from {source_language} to {target_language}. Respond with the translation only, on a single line, without notes or quotes.".to_string()
}

impl Config {

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        if self.markup.base_font_size == 0 {
            return Err(anyhow!("Base font size must be greater than zero"));
        }

        if self.markup.font_name.trim().is_empty() {
            return Err(anyhow!("Font name must not be empty"));
        }

        // Translation backend is only needed when the block is enabled
        if self.markup.translation {
            let provider = &self.translation.provider;
            let provider_config = self.translation.get_active_provider_config()
                .ok_or_else(|| anyhow!("No configuration found for translation provider: {}", provider))?;

            if provider.requires_api_key() && provider_config.api_key.is_empty() {
                return Err(anyhow!("Translation API key is required for {} provider", provider.display_name()));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            markup: MarkupConfig::default(),
            tokenizer: TokenizerConfig::default(),
            output: OutputConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(&self.provider),
        }
    }

    /// Endpoint for a provider, falling back to its public default
    pub fn endpoint_for(&self, provider: &TranslationProvider) -> String {
        match self.get_provider_config(provider) {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => default_endpoint(provider),
        }
    }

    /// Model for a provider, falling back to its default
    pub fn model_for(&self, provider: &TranslationProvider) -> String {
        match self.get_provider_config(provider) {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(provider),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
