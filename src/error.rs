//! Failure taxonomy for subtitle generation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for subtitle generation operations
pub type Result<T> = std::result::Result<T, TranscriptionError>;

/// Why an attempt produced no subtitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The audio source could not be read to completion
    ReadFailure,
    /// The service rejected the MIME type or payload shape
    UnsupportedContent,
    /// The service rejected the request for size or duration limits
    PayloadTooLarge,
    /// The service withheld its output for safety reasons
    SafetyBlocked,
    /// No SRT cue header anywhere in the response
    NoValidSrt,
    /// Any other transport or service failure
    ServiceError,
}

impl FailureKind {
    /// The one sentence shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::ReadFailure => "The audio file could not be read. Please try another file.",
            FailureKind::UnsupportedContent => {
                "This audio format is not supported. Please try a different file."
            }
            FailureKind::PayloadTooLarge => {
                "The audio file is too large or too long. Please try a shorter clip."
            }
            FailureKind::SafetyBlocked => {
                "The content was blocked by the service's safety filters."
            }
            FailureKind::NoValidSrt => {
                "The AI could not process the audio. Please try again or use a clearer recording."
            }
            FailureKind::ServiceError => {
                "The transcription service is unavailable right now. Please try again later."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ReadFailure => "read_failure",
            FailureKind::UnsupportedContent => "unsupported_content",
            FailureKind::PayloadTooLarge => "payload_too_large",
            FailureKind::SafetyBlocked => "safety_blocked",
            FailureKind::NoValidSrt => "no_valid_srt",
            FailureKind::ServiceError => "service_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure, carrying the diagnostic message and the underlying cause.
#[derive(thiserror::Error, Debug)]
#[error("{kind}: {message}")]
pub struct TranscriptionError {
    kind: FailureKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl TranscriptionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause, kept for operator logs.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn read_failure(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ReadFailure, message)
    }

    pub fn no_valid_srt(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NoValidSrt, message)
    }

    pub fn safety_blocked(message: impl Into<String>) -> Self {
        Self::new(FailureKind::SafetyBlocked, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ServiceError, message)
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Diagnostic message, for logs rather than users
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn user_message(&self) -> &'static str {
        self.kind.user_message()
    }
}

impl From<std::io::Error> for TranscriptionError {
    fn from(err: std::io::Error) -> Self {
        TranscriptionError::read_failure(err.to_string()).with_source(err)
    }
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptionError::service(format!("HTTP error: {}", err)).with_source(err)
    }
}
