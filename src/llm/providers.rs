use super::{FinishReason, GenerationRequest, GenerationResponse, GenerativeService, ServiceProvider};
use crate::config::ServiceConfig;
use crate::error::{FailureKind, Result, TranscriptionError};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Gemini provider implementation
pub struct GeminiProvider {
    config: ServiceConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiBlob {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiProvider {
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(anyhow!("Gemini API key required"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl GenerativeService for GeminiProvider {
    async fn generate_content(&self, request: GenerationRequest<'_>) -> Result<GenerationResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| TranscriptionError::service("Gemini API key not configured"))?;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiPart::Text {
                        text: request.instruction,
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiBlob {
                            mime_type: request.payload.mime_type().to_string(),
                            data: request.payload.data().to_string(),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        };

        debug!(
            "Sending request to Gemini model {} ({} bytes of {})",
            self.config.model,
            request.payload.len(),
            request.payload.mime_type()
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read Gemini error body for {}: {}", status, e);
                    String::new()
                }
            };
            let kind = classify_http_error(status, &text);
            warn!("Gemini API error {} classified as {}", status, kind);
            return Err(TranscriptionError::new(
                kind,
                format!("Gemini API error {}: {}", status, error_message(&text)),
            ));
        }

        let raw = response.text().await?;
        parse_gemini_response(&raw)
    }

    fn provider_type(&self) -> ServiceProvider {
        ServiceProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Turn a successful Gemini body into a [`GenerationResponse`]
fn parse_gemini_response(raw: &str) -> Result<GenerationResponse> {
    let parsed: GeminiResponse = serde_json::from_str(raw).map_err(|e| {
        TranscriptionError::service(format!("Malformed Gemini response: {}", e)).with_source(e)
    })?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        debug!("Gemini blocked the prompt: {}", reason);
        return Ok(GenerationResponse::blocked());
    }

    let tokens_used = parsed.usage_metadata.and_then(|u| u.total_token_count);

    let candidate = match parsed.candidates.into_iter().next() {
        Some(candidate) => candidate,
        None => {
            return Ok(GenerationResponse {
                text: None,
                finish_reason: FinishReason::Unspecified,
                tokens_used,
            })
        }
    };

    let finish_reason = candidate
        .finish_reason
        .as_deref()
        .map(FinishReason::from_provider)
        .unwrap_or(FinishReason::Unspecified);

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    GeminiPart::Text { text } => Some(text),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(GenerationResponse {
        text: if text.is_empty() { None } else { Some(text) },
        finish_reason,
        tokens_used,
    })
}

/// Pull the human-readable message out of a Gemini error body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.to_string(),
    }
}

/// Classify a non-success HTTP response into a failure kind.
///
/// Body markers only refine client errors; a 5xx is always a service failure.
pub fn classify_http_error(status: StatusCode, body: &str) -> FailureKind {
    if status.is_server_error() {
        return FailureKind::ServiceError;
    }
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return FailureKind::PayloadTooLarge;
    }
    if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
        return FailureKind::UnsupportedContent;
    }
    if status != StatusCode::BAD_REQUEST {
        return FailureKind::ServiceError;
    }

    let message = error_message(body).to_lowercase();

    // Gemini reports a bad key as 400 INVALID_ARGUMENT
    if message.contains("api key") || message.contains("api_key") {
        return FailureKind::ServiceError;
    }

    let size_markers = ["too large", "exceeds", "payload size", "request entity", "too long"];
    if size_markers.iter().any(|marker| message.contains(marker)) {
        return FailureKind::PayloadTooLarge;
    }

    // Any other INVALID_ARGUMENT is a refused input format
    FailureKind::UnsupportedContent
}
