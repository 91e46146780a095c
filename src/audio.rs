use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::AudioConfig;
use crate::error::{Result, TranscriptionError};

/// Where the audio bytes live until they are encoded
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Bytes already in memory (upload body, microphone recording)
    Memory(Vec<u8>),
    /// A file on disk, read in full at encode time
    File(PathBuf),
}

/// One user-selected or recorded piece of audio.
#[derive(Debug, Clone)]
pub struct AudioInput {
    source: AudioSource,
    mime_type: String,
    filename: Option<String>,
}

impl AudioInput {
    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            source: AudioSource::Memory(bytes),
            mime_type: mime_type.into(),
            filename,
        }
    }

    /// Audio backed by a file. The MIME type is guessed from the extension unless given.
    pub fn from_path(path: impl Into<PathBuf>, mime_type: Option<String>) -> Self {
        let path = path.into();
        let mime_type = mime_type.unwrap_or_else(|| mime_type_for_path(&path).to_string());
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Self {
            source: AudioSource::File(path),
            mime_type,
            filename,
        }
    }

    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Filename without extension, used to name the subtitle file
    pub fn stem(&self) -> Option<String> {
        self.filename.as_deref().and_then(|name| {
            Path::new(name)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    }
}

/// Transmission-safe encoding of an [`AudioInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPayload {
    data: String,
    mime_type: String,
}

impl EncodedPayload {
    /// Base64 (standard alphabet) of the audio bytes
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the encoded payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Normalizes audio inputs into payloads ready for the remote service.
#[derive(Debug, Clone)]
pub struct AudioIngestor {
    /// Binary used to probe duration
    pub ffprobe_path: String,
    /// Durations above this get the long-file hint
    pub long_file_threshold: Duration,
}

impl AudioIngestor {
    pub fn new() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            long_file_threshold: Duration::from_secs(600), // 10 minutes
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self {
            ffprobe_path: config.ffprobe_path.clone(),
            long_file_threshold: Duration::from_secs(config.long_file_hint_seconds),
        }
    }

    /// Read the full audio content and encode it for transmission.
    ///
    /// Fails with `ReadFailure` if the bytes cannot be read to completion. No retries.
    pub async fn encode(&self, input: &AudioInput) -> Result<EncodedPayload> {
        let data = match input.source() {
            AudioSource::Memory(bytes) => general_purpose::STANDARD.encode(bytes),
            AudioSource::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    warn!("Failed to read audio file {}: {}", path.display(), e);
                    TranscriptionError::read_failure(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))
                    .with_source(e)
                })?;
                general_purpose::STANDARD.encode(bytes)
            }
        };

        if data.is_empty() {
            warn!("Audio input {:?} is empty", input.filename());
            return Err(TranscriptionError::read_failure("Audio input contains no bytes"));
        }

        debug!(
            "Encoded audio {:?} ({}) into {} base64 bytes",
            input.filename(),
            input.mime_type(),
            data.len()
        );

        Ok(EncodedPayload {
            data,
            mime_type: input.mime_type().to_string(),
        })
    }

    /// Best-effort playback duration. Any failure yields `Duration::ZERO`.
    pub async fn probe_duration(&self, input: &AudioInput) -> Duration {
        match self.run_ffprobe(input).await {
            Ok(duration) => {
                debug!("Probed duration {:.1}s for {:?}", duration.as_secs_f64(), input.filename());
                duration
            }
            Err(e) => {
                debug!("Could not determine duration for {:?}: {}", input.filename(), e);
                Duration::ZERO
            }
        }
    }

    /// Whether a probed duration is long enough to warrant the long-file hint
    pub fn is_long(&self, duration: Duration) -> bool {
        duration > self.long_file_threshold
    }

    async fn run_ffprobe(&self, input: &AudioInput) -> anyhow::Result<Duration> {
        let target = match input.source() {
            AudioSource::File(path) => path.to_string_lossy().into_owned(),
            AudioSource::Memory(_) => "pipe:0".to_string(),
        };

        let mut child = tokio::process::Command::new(&self.ffprobe_path)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_format",
                target.as_str(),
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        if let (AudioSource::Memory(bytes), Some(mut stdin)) = (input.source(), child.stdin.take()) {
            // ffprobe may stop reading once it has the header; a broken pipe is fine.
            if let Err(e) = stdin.write_all(bytes).await {
                debug!("ffprobe closed stdin early: {}", e);
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(anyhow::anyhow!("ffprobe exited with {}", output.status));
        }

        parse_ffprobe_duration(&output.stdout)
            .ok_or_else(|| anyhow::anyhow!("ffprobe reported no duration"))
    }
}

impl Default for AudioIngestor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract `format.duration` from ffprobe's JSON output
fn parse_ffprobe_duration(stdout: &[u8]) -> Option<Duration> {
    let data: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    let seconds: f64 = data["format"]["duration"].as_str()?.parse().ok()?;

    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

/// Guess an audio MIME type from a file extension
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        "aif" | "aiff" => "audio/aiff",
        _ => {
            info!("Unknown audio extension {:?}, sending as application/octet-stream", ext);
            "application/octet-stream"
        }
    }
}
