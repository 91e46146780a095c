use async_trait::async_trait;
use audio_subtitler::error::{FailureKind, Result, TranscriptionError};
use audio_subtitler::llm::{
    FinishReason, GenerationRequest, GenerationResponse, GenerativeService, ServiceProvider,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// What the stub does for one call
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(GenerationResponse),
    Fail(FailureKind, &'static str),
}

impl Scripted {
    pub fn text(text: &str) -> Self {
        Scripted::Respond(GenerationResponse::text(text))
    }

    pub fn safety(text: Option<&str>) -> Self {
        Scripted::Respond(GenerationResponse {
            text: text.map(str::to_string),
            finish_reason: FinishReason::Safety,
            tokens_used: None,
        })
    }
}

/// Deterministic stand-in for the remote service.
///
/// Plays back scripted outcomes in order; the last one repeats forever.
pub struct StubService {
    script: Mutex<VecDeque<Scripted>>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub instruction: String,
    pub mime_type: String,
    pub data: String,
}

impl StubService {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeService for StubService {
    async fn generate_content(&self, request: GenerationRequest<'_>) -> Result<GenerationResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            instruction: request.instruction,
            mime_type: request.payload.mime_type().to_string(),
            data: request.payload.data().to_string(),
        });

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            }
        };

        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(kind, message)) => Err(TranscriptionError::new(kind, message)),
            None => Err(TranscriptionError::service("stub has no script")),
        }
    }

    fn provider_type(&self) -> ServiceProvider {
        ServiceProvider::Gemini
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}
