pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio::EncodedPayload;
use crate::config::ServiceConfig;
use crate::error::Result;

/// Generative service provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceProvider {
    Gemini,
}

/// One request to the generative service: instruction text plus inline audio.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub instruction: String,
    pub payload: &'a EncodedPayload,
}

/// Why the service stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    /// Output withheld for policy reasons
    Safety,
    Other(String),
    Unspecified,
}

impl FinishReason {
    /// Map a provider finish-reason string
    pub fn from_provider(reason: &str) -> Self {
        match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => FinishReason::Safety,
            "" | "FINISH_REASON_UNSPECIFIED" => FinishReason::Unspecified,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn is_safety_block(&self) -> bool {
        matches!(self, FinishReason::Safety)
    }
}

/// Generative service response
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// Generated text, if the service produced any
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    pub tokens_used: Option<u32>,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: FinishReason::Stop,
            tokens_used: None,
        }
    }

    pub fn blocked() -> Self {
        Self {
            text: None,
            finish_reason: FinishReason::Safety,
            tokens_used: None,
        }
    }
}

/// Trait for audio-to-text generative services.
///
/// Implementations classify their own transport failures into a
/// [`FailureKind`](crate::error::FailureKind) before returning.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate_content(&self, request: GenerationRequest<'_>) -> Result<GenerationResponse>;
    fn provider_type(&self) -> ServiceProvider;
    fn model(&self) -> &str;
}

/// Create a service instance based on configuration
pub fn create_service(config: &ServiceConfig) -> anyhow::Result<Arc<dyn GenerativeService>> {
    match config.provider {
        ServiceProvider::Gemini => Ok(Arc::new(providers::GeminiProvider::new(config.clone())?)),
    }
}
