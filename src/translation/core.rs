/*!
 * Core translation service implementation.
 * 
 * `TranslationService` owns one client per usable configured provider and
 * answers `Translator::translate` calls for any of them, so a single run can
 * name its backend per call. Each call is bounded by the configured timeout
 * and identical lines are served from the cache.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use url::Url;

use crate::app_config::{TranslationCommonConfig, TranslationConfig, TranslationProvider};
use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;
use super::Translator;
use super::cache::TranslationCache;

/// Upper bound on generated tokens for one subtitle line
const MAX_TRANSLATION_TOKENS: u32 = 1024;

/// Check that an endpoint is a usable http(s) URL
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }
    
    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };
    
    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }
    
    Ok(url)
}

/// Client variants; LM Studio speaks the OpenAI protocol
#[derive(Debug)]
enum ProviderClient {
    Ollama(Ollama),
    OpenAI(OpenAI),
    Anthropic(Anthropic),
}

/// A configured backend
#[derive(Debug)]
struct Backend {
    provider: TranslationProvider,
    model: String,
    client: ProviderClient,
}

/// Main translation service for subtitle lines
#[derive(Debug)]
pub struct TranslationService {
    /// Usable backends, in configuration order
    backends: Vec<Backend>,
    
    /// Prompt, timeout and temperature shared by all backends
    common: TranslationCommonConfig,
    
    /// Translation cache for storing and retrieving translations
    cache: TranslationCache,
}

impl TranslationService {
    /// Create a translation service with a backend for every configured
    /// provider that can be used (hosted providers need an API key)
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.common.timeout_secs.max(1));
        let mut backends = Vec::new();
        
        for provider_config in &config.available_providers {
            let Some(provider) = provider_config.provider() else {
                warn!("Ignoring unknown translation provider: {}", provider_config.provider_type);
                continue;
            };
            if backends.iter().any(|b: &Backend| b.provider == provider) {
                continue;
            }
            if provider.requires_api_key() && provider_config.api_key.is_empty() {
                debug!("Skipping {}: no API key configured", provider.display_name());
                continue;
            }
            
            let endpoint = config.endpoint_for(&provider);
            parse_endpoint(&endpoint)
                .map_err(|e| anyhow!("Invalid endpoint for {}: {}", provider.display_name(), e))?;
            let api_key = provider_config.api_key.clone();
            
            let client = match provider {
                TranslationProvider::Ollama => ProviderClient::Ollama(Ollama::new(endpoint, timeout)),
                TranslationProvider::OpenAI => ProviderClient::OpenAI(OpenAI::new(api_key, endpoint, timeout)),
                TranslationProvider::LMStudio => {
                    // LM Studio often doesn't require an API key; use a default if empty
                    let api_key = if api_key.is_empty() { "lm-studio".to_string() } else { api_key };
                    ProviderClient::OpenAI(OpenAI::new(api_key, endpoint, timeout))
                },
                TranslationProvider::Anthropic => ProviderClient::Anthropic(Anthropic::new(api_key, endpoint, timeout)),
            };
            
            debug!("Configured translation backend {} ({})", provider.display_name(), config.model_for(&provider));
            backends.push(Backend {
                model: config.model_for(&provider),
                provider,
                client,
            });
        }
        
        if backends.is_empty() {
            return Err(anyhow!("No usable translation provider is configured"));
        }
        
        Ok(Self {
            backends,
            common: config.common.clone(),
            cache: TranslationCache::with_max_entries(config.common.cache_enabled, config.common.cache_max_entries),
        })
    }
    
    /// Whether a backend exists for `provider`
    pub fn has_backend(&self, provider: &TranslationProvider) -> bool {
        self.backends.iter().any(|b| &b.provider == provider)
    }
    
    /// The line cache
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }
    
    /// System prompt with the language placeholders filled in
    pub fn system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
        self.common.system_prompt
            .replace("{source_language}", &name(source_language))
            .replace("{target_language}", &name(target_language))
    }
    
    async fn request(&self, backend: &Backend, text: &str, system_prompt: String) -> Result<String, TranslationError> {
        let temperature = self.common.temperature;
        let output = match &backend.client {
            ProviderClient::Ollama(client) => {
                let request = GenerationRequest::new(&backend.model, text)
                    .system(system_prompt)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ollama::extract_text(&response)
            },
            ProviderClient::OpenAI(client) => {
                let request = OpenAIRequest::new(&backend.model)
                    .add_message("system", system_prompt)
                    .add_message("user", text)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                OpenAI::extract_text(&response)
            },
            ProviderClient::Anthropic(client) => {
                let request = AnthropicRequest::new(&backend.model, MAX_TRANSLATION_TOKENS)
                    .system(system_prompt)
                    .add_message("user", text)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Anthropic::extract_text(&response)
            },
        };
        Ok(output)
    }
}

#[async_trait]
impl Translator for TranslationService {
    async fn translate(
        &self,
        text: &str,
        service: &TranslationProvider,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        if let Some(cached) = self.cache.get(text, service, source_language, target_language) {
            return Ok(cached);
        }
        
        let backend = self.backends.iter()
            .find(|b| &b.provider == service)
            .ok_or_else(|| TranslationError::UnknownService(service.display_name().to_string()))?;
        
        let system_prompt = self.system_prompt(source_language, target_language);
        let timeout_secs = self.common.timeout_secs;
        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.request(backend, text, system_prompt),
        )
        .await
        .map_err(|_| TranslationError::Timeout(timeout_secs))??;
        
        let translation = output.trim();
        if translation.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        
        self.cache.store(text, service, source_language, target_language, translation);
        Ok(translation.to_string())
    }
}
