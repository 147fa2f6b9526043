/*! 
 * Provider implementations for different translation services.
 * 
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 */

use async_trait::async_trait;
use log::error;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
/// 
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;
    
    /// The response type for this provider
    type Response: Send + Sync;
    
    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;
    
    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Map a transport failure to a provider error
pub(crate) fn send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(format!("{}: {}", provider, error))
    } else {
        ProviderError::RequestFailed(format!("{}: {}", provider, error))
    }
}

/// Check the status of a response and decode its JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(provider: &str, response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        error!("{} API error ({}): {}", provider, status, message);
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
            _ => ProviderError::ApiError { status_code: status.as_u16(), message },
        });
    }

    response.json::<T>().await
        .map_err(|e| ProviderError::ParseError(format!("{}: {}", provider, e)))
}

pub mod ollama;
pub mod openai;
pub mod anthropic;
