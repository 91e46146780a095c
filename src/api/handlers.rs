//! API request handlers

use axum::extract::Multipart;
use axum::http::StatusCode;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::models::HealthInfo;
use crate::audio::{mime_type_for_path, AudioIngestor, AudioInput};
use crate::error::{FailureKind, Result, TranscriptionError};
use crate::transcription::{LanguageMode, SrtDocument, SubtitleGenerator};

/// A parsed `POST /api/subtitles` form
#[derive(Debug)]
pub struct SubtitleUpload {
    pub input: AudioInput,
    pub mode: LanguageMode,
}

/// A generated document plus what the response needs to describe it
#[derive(Debug)]
pub struct SubtitleResult {
    pub document: SrtDocument,
    pub filename: String,
    pub duration: Duration,
    pub long_file: bool,
}

/// Handle health check requests
pub fn health_check(model: &str) -> HealthInfo {
    HealthInfo {
        status: "healthy".to_string(),
        service: "audio-subtitler".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: model.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// HTTP status for each failure kind
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ReadFailure => StatusCode::BAD_REQUEST,
        FailureKind::UnsupportedContent => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        FailureKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FailureKind::SafetyBlocked | FailureKind::NoValidSrt => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::ServiceError => StatusCode::BAD_GATEWAY,
    }
}

/// Read the multipart form: a `file` part and an optional `language` part
pub async fn read_upload(mut multipart: Multipart) -> Result<SubtitleUpload> {
    let mut input = None;
    let mut mode = LanguageMode::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                debug!("Received upload {:?} ({} bytes)", filename, bytes.len());

                let mime_type = mime_type
                    .filter(|m| m != "application/octet-stream")
                    .or_else(|| {
                        filename
                            .as_deref()
                            .map(|name| mime_type_for_path(Path::new(name)).to_string())
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                input = Some(AudioInput::from_bytes(bytes.to_vec(), mime_type, filename));
            }
            Some("language") => {
                let value = field.text().await.map_err(multipart_error)?;
                mode = value.parse().map_err(|e: String| {
                    TranscriptionError::new(FailureKind::UnsupportedContent, e)
                })?;
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let input = input.ok_or_else(|| {
        TranscriptionError::read_failure("Form did not contain a `file` part")
    })?;

    Ok(SubtitleUpload { input, mode })
}

/// Run one generation for an upload
pub async fn create_subtitles(
    generator: &SubtitleGenerator,
    ingestor: &AudioIngestor,
    upload: SubtitleUpload,
) -> Result<SubtitleResult> {
    let duration = ingestor.probe_duration(&upload.input).await;
    let long_file = ingestor.is_long(duration);
    if long_file {
        info!(
            "⏱️  Long upload {:?}: {:.0} minutes",
            upload.input.filename(),
            duration.as_secs_f64() / 60.0
        );
    }

    let document = generator
        .generate_from_input(ingestor, &upload.input, upload.mode)
        .await?;
    let stem = upload.input.stem().map(|stem| header_safe(&stem));
    let filename = SrtDocument::suggested_filename(stem.as_deref(), upload.mode);

    Ok(SubtitleResult {
        document,
        filename,
        duration,
        long_file,
    })
}

/// Strip characters that cannot appear inside a quoted `Content-Disposition` filename
fn header_safe(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> TranscriptionError {
    let kind = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        FailureKind::PayloadTooLarge
    } else {
        FailureKind::ReadFailure
    };
    TranscriptionError::new(kind, format!("Failed to read upload: {}", err.body_text()))
}
