//! Answering service seam.
//!
//! The notebook never answers questions itself: it hands the question and the
//! active sources to an [`AnsweringService`]. [`LlmAnsweringService`] is the
//! production implementation on top of a `notebook_llm` client.

use crate::prompt::{system_prompt, PromptBuilder};
use crate::types::{ServiceReply, Source};
use notebook_core::AppResult;
use notebook_llm::{LlmClient, LlmRequest};
use std::sync::Arc;

/// External collaborator that answers a question grounded in sources.
#[async_trait::async_trait]
pub trait AnsweringService: Send + Sync {
    async fn answer(&self, question: &str, sources: &[Source]) -> AppResult<ServiceReply>;
}

/// Answers through an LLM provider, requesting web grounding for citations.
pub struct LlmAnsweringService {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptBuilder,
}

impl LlmAnsweringService {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptBuilder) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }

    fn build_request(&self, question: &str, sources: &[Source]) -> AppResult<LlmRequest> {
        let user_prompt = self.prompt.render(question, sources)?;

        Ok(LlmRequest::new(user_prompt, self.model.clone())
            .with_system(system_prompt(!sources.is_empty()))
            .with_temperature(0.3)
            .with_max_tokens(1000)
            .with_web_grounding())
    }
}

#[async_trait::async_trait]
impl AnsweringService for LlmAnsweringService {
    async fn answer(&self, question: &str, sources: &[Source]) -> AppResult<ServiceReply> {
        tracing::debug!(
            provider = self.client.provider_name(),
            sources = sources.len(),
            "Requesting grounded answer"
        );

        let request = self.build_request(question, sources)?;
        let response = self.client.complete(&request).await?;

        let links = if response.grounding.is_empty() {
            None
        } else {
            Some(response.grounding)
        };

        Ok(ServiceReply {
            text: response.content,
            links,
        })
    }
}
