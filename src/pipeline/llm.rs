//! Model access: send (job description, page image, prompt) and get text back.
//!
//! [`ModelClient`] is the only seam between the session logic and the network.
//! Two implementations ship:
//!
//! * [`GeminiClient`] talks to the Gemini `generateContent` REST endpoint
//!   directly, sending the three inputs as three ordered `parts`.
//! * [`ProviderClient`] routes through `edgequake-llm`, so any provider it
//!   supports (OpenAI, Anthropic, Gemini, Ollama…) can do the analysis.
//!
//! Both make exactly one round trip per call. Failures are mapped to a
//! [`RemoteServiceError`] that keeps the remote status and message, and are
//! returned to the caller as-is: no retry, no fallback.

use crate::config::ModelConfig;
use crate::error::RemoteServiceError;
use crate::pipeline::encode::EncodedImagePart;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Capability to turn a résumé image plus instructions into text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one generation. `text` is the job description and may be empty.
    async fn generate(
        &self,
        text: &str,
        image: &EncodedImagePart,
        prompt: &str,
    ) -> Result<String, RemoteServiceError>;

    /// Short identifier for logs and reports.
    fn name(&self) -> &str;
}

// ── Gemini REST ──────────────────────────────────────────────────────────────

const GEMINI: &str = "gemini";

/// Direct client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
    generation: Option<GenerationConfig>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl GeminiClient {
    /// Build a client from explicit settings. A missing API key is accepted
    /// here and reported by the first [`ModelClient::generate`] call.
    pub fn new(config: &ModelConfig) -> Result<Self, RemoteServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ats-resume/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http(http, config))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, config: &ModelConfig) -> Self {
        let generation = (config.temperature.is_some() || config.max_tokens.is_some()).then(|| {
            GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            }
        });
        Self {
            http,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model_or_default().to_string(),
            endpoint: config.endpoint_or_default().to_string(),
            generation,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `{endpoint}/v1beta/models/{model}:generateContent`
    pub fn url(&self) -> String {
        let model = self.model.strip_prefix("models/").unwrap_or(&self.model);
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }

    /// Assemble the request body.
    pub fn build_request(
        &self,
        text: &str,
        image: &EncodedImagePart,
        prompt: &str,
    ) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(3);
        // The API rejects empty text parts.
        if !text.is_empty() {
            parts.push(Part::Text {
                text: text.to_string(),
            });
        }
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });
        parts.push(Part::Text {
            text: prompt.to_string(),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: self.generation.clone(),
        }
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(
        &self,
        text: &str,
        image: &EncodedImagePart,
        prompt: &str,
    ) -> Result<String, RemoteServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| RemoteServiceError::Auth {
            provider: GEMINI.to_string(),
            detail: "no API key configured (set GENAI_API_KEY)".to_string(),
        })?;

        let body = self.build_request(text, image, prompt);
        let start = Instant::now();
        info!("Calling {} ({} bytes image)", self.model, image.data.len());

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let raw = response.text().await?;
        debug!(
            "{} answered HTTP {} in {:?} ({} bytes)",
            self.model,
            status,
            start.elapsed(),
            raw.len()
        );

        parse_response(status, retry_after, &raw)
    }

    fn name(&self) -> &str {
        GEMINI
    }
}

/// Map an HTTP status and body to the generated text or a typed error.
pub fn parse_response(
    status: u16,
    retry_after_secs: Option<u64>,
    body: &str,
) -> Result<String, RemoteServiceError> {
    if !(200..300).contains(&status) {
        let (message, api_status) = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| (e.error.message, e.error.status.unwrap_or_default()))
            .unwrap_or_else(|_| (body.trim().to_string(), String::new()));

        let auth_failure = matches!(status, 401 | 403)
            || api_status == "UNAUTHENTICATED"
            || api_status == "PERMISSION_DENIED"
            || message.contains("API key");

        return Err(if auth_failure {
            RemoteServiceError::Auth {
                provider: GEMINI.to_string(),
                detail: message,
            }
        } else if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
            RemoteServiceError::RateLimited {
                provider: GEMINI.to_string(),
                retry_after_secs,
            }
        } else {
            RemoteServiceError::Api {
                provider: GEMINI.to_string(),
                status: Some(status),
                message,
            }
        });
    }

    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| RemoteServiceError::Decode {
            provider: GEMINI.to_string(),
            detail: e.to_string(),
        })?;

    if let Some(ref usage) = parsed.usage_metadata {
        debug!(
            "Gemini usage: {} prompt tokens, {} output tokens",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(RemoteServiceError::Blocked {
            provider: GEMINI.to_string(),
            reason,
        });
    };

    let text: String = candidate
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(RemoteServiceError::Blocked {
            provider: GEMINI.to_string(),
            reason: candidate
                .finish_reason
                .unwrap_or_else(|| "empty response".to_string()),
        });
    }

    Ok(text)
}

// ── Gemini wire types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

// ── edgequake-llm providers ──────────────────────────────────────────────────

/// Adapter over any `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>, config: &ModelConfig) -> Self {
        Self {
            provider,
            label: label.into(),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    /// One user turn: job description then prompt as text, the page as an
    /// attached image.
    async fn generate(
        &self,
        text: &str,
        image: &EncodedImagePart,
        prompt: &str,
    ) -> Result<String, RemoteServiceError> {
        let body = if text.is_empty() {
            prompt.to_string()
        } else {
            format!("{text}\n\n{prompt}")
        };
        let messages = vec![ChatMessage::user_with_images(
            &body,
            vec![ImageData::new(image.data.clone(), image.mime_type.clone())],
        )];

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| classify_provider_error(&self.label, e.to_string()))?;

        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.label,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Build `CompletionOptions` from the model config.
fn build_options(config: &ModelConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

/// Sort a provider error message into the closest [`RemoteServiceError`].
fn classify_provider_error(provider: &str, message: String) -> RemoteServiceError {
    let lower = message.to_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("api key")
        || lower.contains("authentication")
    {
        RemoteServiceError::Auth {
            provider: provider.to_string(),
            detail: message,
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        RemoteServiceError::RateLimited {
            provider: provider.to_string(),
            retry_after_secs: None,
        }
    } else {
        RemoteServiceError::Api {
            provider: provider.to_string(),
            status: None,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> EncodedImagePart {
        EncodedImagePart::from_jpeg_bytes(b"\xFF\xD8\xFF\xE0")
    }

    fn client(config: ModelConfig) -> GeminiClient {
        GeminiClient::with_http(reqwest::Client::new(), &config)
    }

    #[test]
    fn request_has_three_ordered_parts() {
        let c = client(ModelConfig::default());
        let body = serde_json::to_value(c.build_request("Senior Rust role", &image(), "Act as")).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(parts.as_array().unwrap().len(), 3);
        assert_eq!(parts[0]["text"], "Senior Rust role");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], image().data);
        assert_eq!(parts[2]["text"], "Act as");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn empty_job_description_part_is_dropped() {
        let c = client(ModelConfig::default());
        let body = serde_json::to_value(c.build_request("", &image(), "Act as")).unwrap();
        let parts = body["contents"][0]["parts"].as_array().unwrap().clone();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].get("inline_data").is_some());
    }

    #[test]
    fn generation_config_forwarded_when_set() {
        let c = client(ModelConfig {
            temperature: Some(0.2),
            max_tokens: Some(1024),
            ..ModelConfig::default()
        });
        let body = serde_json::to_value(c.build_request("jd", &image(), "p")).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert!(body["generationConfig"]["temperature"].as_f64().unwrap() > 0.19);
    }

    #[test]
    fn url_uses_model_and_endpoint() {
        let c = client(ModelConfig {
            model: Some("models/gemini-2.0-flash".into()),
            endpoint: Some("http://localhost:9000/".into()),
            ..ModelConfig::default()
        });
        assert_eq!(
            c.url(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_at_invocation() {
        let c = client(ModelConfig::default());
        let err = c.generate("jd", &image(), "prompt").await.unwrap_err();
        assert!(matches!(err, RemoteServiceError::Auth { .. }), "{err:?}");
    }

    #[test]
    fn parse_success_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Match: "}, {"text": "72%"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 900, "candidatesTokenCount": 40}
        }"#;
        assert_eq!(parse_response(200, None, body).unwrap(), "Match: 72%");
    }

    #[test]
    fn parse_invalid_key_is_auth() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = parse_response(400, None, body).unwrap_err();
        assert!(matches!(err, RemoteServiceError::Auth { .. }), "{err:?}");
    }

    #[test]
    fn parse_quota_is_rate_limited() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        match parse_response(429, Some(30), body).unwrap_err() {
            RemoteServiceError::RateLimited {
                retry_after_secs, ..
            } => assert_eq!(retry_after_secs, Some(30)),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn parse_server_error_keeps_status_and_message() {
        match parse_response(503, None, "upstream overloaded").unwrap_err() {
            RemoteServiceError::Api {
                status, message, ..
            } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "upstream overloaded");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn parse_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        match parse_response(200, None, body).unwrap_err() {
            RemoteServiceError::Blocked { reason, .. } => assert_eq!(reason, "SAFETY"),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[test]
    fn parse_garbage_is_decode_error() {
        assert!(matches!(
            parse_response(200, None, "<html>").unwrap_err(),
            RemoteServiceError::Decode { .. }
        ));
    }

    #[test]
    fn provider_errors_are_classified() {
        assert!(matches!(
            classify_provider_error("openai", "HTTP 401 Unauthorized".into()),
            RemoteServiceError::Auth { .. }
        ));
        assert!(matches!(
            classify_provider_error("openai", "Rate limit reached".into()),
            RemoteServiceError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_provider_error("openai", "context length exceeded".into()),
            RemoteServiceError::Api { .. }
        ));
    }

    #[test]
    fn build_options_passes_through() {
        let opts = build_options(&ModelConfig {
            temperature: Some(0.3),
            max_tokens: Some(2048),
            ..ModelConfig::default()
        });
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(2048));
    }
}
