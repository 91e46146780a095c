//! Audio Subtitler
//!
//! Turns an audio recording into time-aligned SubRip subtitles, optionally translated
//! to English, by orchestrating a generative audio-to-text service and defensively
//! validating what it returns.

pub mod audio;
pub mod config;
pub mod error;
pub mod llm;
pub mod transcription;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::audio::{AudioIngestor, AudioInput, AudioSource, EncodedPayload};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{FailureKind, TranscriptionError};
pub use crate::llm::{create_service, GenerativeService, ServiceProvider};
pub use crate::transcription::{
    LanguageMode, SrtCue, SrtDocument, SubtitleGenerator, SubtitleSession,
};
