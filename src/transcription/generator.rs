use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::prompts::instruction_for;
use super::srt::{clean_response, SrtDocument};
use super::LanguageMode;
use crate::audio::{AudioIngestor, AudioInput, EncodedPayload};
use crate::config::ServiceConfig;
use crate::error::{Result, TranscriptionError};
use crate::llm::{create_service, GenerationRequest, GenerativeService};

/// Turns encoded audio into a validated SRT document via a generative service.
///
/// Stateless per call: every `generate` receives fresh inputs and returns a
/// self-contained result. Sequencing attempts is the caller's job.
#[derive(Clone)]
pub struct SubtitleGenerator {
    service: Arc<dyn GenerativeService>,
}

impl SubtitleGenerator {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self { service }
    }

    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let service = create_service(config)?;
        info!(
            "✅ Subtitle generator ready with {:?} model {}",
            service.provider_type(),
            service.model()
        );
        Ok(Self::new(service))
    }

    pub fn service(&self) -> &dyn GenerativeService {
        self.service.as_ref()
    }

    /// Run one generation attempt.
    pub async fn generate(&self, payload: &EncodedPayload, mode: LanguageMode) -> Result<SrtDocument> {
        let start_time = Instant::now();
        info!(
            "🎤 Generating {} subtitles for {} payload ({} bytes)",
            mode,
            payload.mime_type(),
            payload.len()
        );

        let result = self.attempt(payload, mode).await;

        match &result {
            Ok(document) => info!(
                "🎉 Subtitles generated in {:.1}s ({} chars)",
                start_time.elapsed().as_secs_f64(),
                document.as_str().len()
            ),
            Err(e) => warn!(
                "❌ Subtitle generation failed after {:.1}s [{}]: {}",
                start_time.elapsed().as_secs_f64(),
                e.kind(),
                e.message()
            ),
        }

        result
    }

    /// Encode the input fresh and generate from it.
    pub async fn generate_from_input(
        &self,
        ingestor: &AudioIngestor,
        input: &AudioInput,
        mode: LanguageMode,
    ) -> Result<SrtDocument> {
        let payload = ingestor.encode(input).await.map_err(|e| {
            warn!("❌ Failed to encode {:?} [{}]: {}", input.filename(), e.kind(), e.message());
            e
        })?;
        self.generate(&payload, mode).await
    }

    async fn attempt(&self, payload: &EncodedPayload, mode: LanguageMode) -> Result<SrtDocument> {
        let request = GenerationRequest {
            instruction: instruction_for(mode),
            payload,
        };

        let response = self.service.generate_content(request).await?;
        debug!(
            "Service finished with {:?} (tokens: {:?})",
            response.finish_reason, response.tokens_used
        );

        if response.finish_reason.is_safety_block() {
            return Err(TranscriptionError::safety_blocked(format!(
                "{} withheld the output for safety reasons",
                self.service.model()
            )));
        }

        let text = response.text.ok_or_else(|| {
            TranscriptionError::no_valid_srt(format!(
                "{} returned no text (finish reason {:?})",
                self.service.model(),
                response.finish_reason
            ))
        })?;

        clean_response(&text)
    }
}
