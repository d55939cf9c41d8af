//! Gemini provider implementation.
//!
//! Calls the Generative Language `generateContent` endpoint. When the request
//! asks for web grounding the Google Search tool is enabled, and the
//! candidate's `groundingMetadata.groundingChunks` become the response's
//! grounding list.

use super::{error_from_response, http_client};
use crate::client::{GroundingChunk, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use notebook_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: http_client(timeout)?,
        })
    }

    fn to_gemini_request(&self, request: &LlmRequest) -> GenerateContentRequest {
        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some()
        {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        let tools = if request.web_grounding {
            vec![Tool {
                google_search: serde_json::json!({}),
            }]
        } else {
            Vec::new()
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                }],
            }],
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: Some(system.clone()),
                }],
            }),
            tools,
            generation_config,
        }
    }

    fn convert_response(
        &self,
        request: &LlmRequest,
        response: GenerateContentResponse,
    ) -> AppResult<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("No candidate in Gemini response".to_string()))?;

        let content = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let grounding = candidate
            .grounding_metadata
            .map(|metadata| metadata.grounding_chunks)
            .unwrap_or_default();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response
                .model_version
                .unwrap_or_else(|| request.model.clone()),
            usage,
            grounding,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(model = %request.model, grounded = request.web_grounding, "Sending completion request to Gemini");

        let body = self.to_gemini_request(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini", response).await);
        }

        let gemini_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        let converted = self.convert_response(request, gemini_response)?;
        tracing::info!(
            grounding = converted.grounding.len(),
            "Received completion from Gemini"
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(DEFAULT_GEMINI_URL, "test-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_enables_search_tool_when_grounded() {
        let request = LlmRequest::new("What PPE is required?", "gemini-2.5-pro")
            .with_system("Answer from the sources")
            .with_web_grounding();

        let body = serde_json::to_value(client().to_gemini_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What PPE is required?");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "Answer from the sources"
        );
        assert!(body["tools"][0]["googleSearch"].is_object());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_without_grounding_has_no_tools() {
        let request = LlmRequest::new("Hello", "gemini-2.5-pro").with_temperature(0.2);
        let body = serde_json::to_value(client().to_gemini_request(&request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["generationConfig"]["temperature"].as_f64().unwrap() as f32, 0.2);
    }

    #[test]
    fn test_convert_response_keeps_grounding_order() {
        let raw: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Wear "}, {"text": "gloves."}]},
                    "groundingMetadata": {
                        "groundingChunks": [
                            {"web": {"uri": "http://x", "title": "Policy A"}},
                            {"retrievedContext": {"uri": "gs://bucket/doc"}},
                            {"web": {"uri": "http://y"}}
                        ]
                    }
                }],
                "usageMetadata": {"promptTokenCount": 20, "candidatesTokenCount": 4, "totalTokenCount": 24}
            }"#,
        )
        .unwrap();

        let request = LlmRequest::new("q", "gemini-2.5-pro");
        let response = client().convert_response(&request, raw).unwrap();

        assert_eq!(response.content, "Wear gloves.");
        assert_eq!(response.model, "gemini-2.5-pro");
        assert_eq!(response.usage.total_tokens, 24);
        assert_eq!(response.grounding.len(), 3);
        assert_eq!(response.grounding[0], GroundingChunk::web("http://x", Some("Policy A")));
        assert!(response.grounding[1].web.is_none());
        assert_eq!(response.grounding[2], GroundingChunk::web("http://y", None));
    }

    #[test]
    fn test_convert_response_without_candidates_fails() {
        let raw: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let request = LlmRequest::new("q", "gemini-2.5-pro");
        assert!(matches!(
            client().convert_response(&request, raw),
            Err(AppError::Llm(_))
        ));
    }
}
