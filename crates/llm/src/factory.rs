//! LLM provider factory.
//!
//! Creates a client from a provider name, an optional endpoint and an
//! optional API key.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use notebook_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "gemini")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by Gemini)
/// * `timeout` - Transport timeout for each request
///
/// # Errors
/// Returns `AppError::Llm` if the provider is unknown, a required secret is
/// missing or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Llm(format!("Unknown provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    tracing::debug!(provider = provider_type.as_str(), base_url, "Creating LLM client");

    match provider_type {
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::new(base_url, timeout)?)),
        ProviderType::Gemini => {
            let api_key = api_key
                .ok_or_else(|| AppError::Llm("Gemini provider requires API key".to_string()))?;
            Ok(Arc::new(GeminiClient::new(base_url, api_key, timeout)?))
        }
    }
}
