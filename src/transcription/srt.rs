use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use super::LanguageMode;
use crate::error::{Result, TranscriptionError};

/// Index line, line break, timing line. Both `,` and `.` are accepted before milliseconds.
const CUE_HEADER_PATTERN: &str =
    r"\d+[ \t]*\r?\n\d{2}:\d{2}:\d{2}[,.]\d{3} --> \d{2}:\d{2}:\d{2}[,.]\d{3}";

/// A fenced code block, optionally tagged `srt`
const MARKDOWN_FENCE_PATTERN: &str = r"(?s)```(?i:srt)?[ \t]*\r?\n?(.*?)```";

const TIMING_PATTERN: &str =
    r"^\s*(\d{2}:\d{2}:\d{2}[,.]\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2}[,.]\d{3})";

fn cue_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CUE_HEADER_PATTERN).expect("cue header pattern is valid"))
}

fn markdown_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MARKDOWN_FENCE_PATTERN).expect("fence pattern is valid"))
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMING_PATTERN).expect("timing pattern is valid"))
}

/// Subtitle text that starts with a well-formed SRT cue header.
///
/// Only the leading cue is checked. Everything after it is kept as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SrtDocument(String);

impl SrtDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Parse the document into cues, skipping blocks that do not parse
    pub fn cues(&self) -> Vec<SrtCue> {
        let normalized = self.0.replace("\r\n", "\n");
        normalized
            .split("\n\n")
            .filter_map(SrtCue::parse_block)
            .collect()
    }

    pub fn first_cue(&self) -> Option<SrtCue> {
        let normalized = self.0.replace("\r\n", "\n");
        normalized.split("\n\n").next().and_then(SrtCue::parse_block)
    }

    /// Download name for this document, e.g. `interview.srt` or `interview.en.srt`
    pub fn suggested_filename(stem: Option<&str>, mode: LanguageMode) -> String {
        let stem = stem.filter(|s| !s.trim().is_empty()).unwrap_or("subtitles");
        match mode {
            LanguageMode::Original => format!("{}.srt", stem),
            LanguageMode::English => format!("{}.en.srt", stem),
        }
    }

    /// Save SRT to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let mut content = self.0.clone();
        content.push('\n');
        tokio::fs::write(path.as_ref(), content).await?;
        Ok(())
    }
}

impl AsRef<str> for SrtDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SrtDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stages of turning a raw service response into an [`SrtDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleaningStage {
    Raw(String),
    MarkdownUnwrapped(String),
    CueAnchored(String),
    Validated(SrtDocument),
}

impl CleaningStage {
    /// Run one stage. Fails with `NoValidSrt` when no cue header can be anchored.
    pub fn advance(self) -> Result<CleaningStage> {
        match self {
            CleaningStage::Raw(text) => {
                let text = match unwrap_markdown(&text) {
                    Some(interior) => {
                        debug!("Unwrapped markdown fence ({} chars inside)", interior.len());
                        interior
                    }
                    None => text,
                };
                Ok(CleaningStage::MarkdownUnwrapped(text))
            }
            CleaningStage::MarkdownUnwrapped(text) => match find_cue_anchor(&text) {
                Some(offset) => {
                    if offset > 0 {
                        debug!("Discarding {} bytes of preamble before first cue", offset);
                    }
                    Ok(CleaningStage::CueAnchored(text[offset..].to_string()))
                }
                None => Err(TranscriptionError::no_valid_srt(format!(
                    "No SRT cue header found in response ({} chars): {:?}",
                    text.len(),
                    preview(&text)
                ))),
            },
            CleaningStage::CueAnchored(text) => {
                Ok(CleaningStage::Validated(SrtDocument(text.trim().to_string())))
            }
            validated @ CleaningStage::Validated(_) => Ok(validated),
        }
    }
}

/// Turn raw response text into a validated document
pub fn clean_response(raw: &str) -> Result<SrtDocument> {
    let mut stage = CleaningStage::Raw(raw.to_string());
    loop {
        stage = stage.advance()?;
        if let CleaningStage::Validated(document) = stage {
            return Ok(document);
        }
    }
}

/// Interior of the first fenced code block, trimmed
pub fn unwrap_markdown(text: &str) -> Option<String> {
    markdown_fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|interior| interior.as_str().trim().to_string())
}

/// Byte offset of the first cue header
pub fn find_cue_anchor(text: &str) -> Option<usize> {
    cue_header_regex().find(text).map(|m| m.start())
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        preview.push('…');
    }
    preview
}

/// One subtitle cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrtCue {
    /// Sequential number
    pub index: u32,
    /// Start timestamp
    pub start: Duration,
    /// End timestamp
    pub end: Duration,
    /// Subtitle text, lines joined with `\n`
    pub text: String,
}

impl SrtCue {
    fn parse_block(block: &str) -> Option<SrtCue> {
        let mut lines = block.trim().lines();
        let index = lines.next()?.trim().parse().ok()?;
        let caps = timing_regex().captures(lines.next()?)?;
        let start = SrtFormatter::parse_timestamp(&caps[1]).ok()?;
        let end = SrtFormatter::parse_timestamp(&caps[2]).ok()?;
        let text = lines.collect::<Vec<_>>().join("\n");

        Some(SrtCue {
            index,
            start,
            end,
            text,
        })
    }
}

impl fmt::Display for SrtCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            SrtFormatter::format_timestamp(self.start),
            SrtFormatter::format_timestamp(self.end),
            self.text
        )
    }
}

/// SRT timestamp utilities
pub struct SrtFormatter;

impl SrtFormatter {
    /// Format duration for SRT timestamp (HH:MM:SS,mmm)
    pub fn format_timestamp(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let milliseconds = duration.subsec_millis();

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, milliseconds)
    }

    /// Parse a single timestamp (HH:MM:SS,mmm or HH:MM:SS.mmm)
    pub fn parse_timestamp(timestamp: &str) -> anyhow::Result<Duration> {
        let (hms, millis) = timestamp
            .trim()
            .split_once(&[',', '.'][..])
            .ok_or_else(|| anyhow!("Invalid timestamp format: {}", timestamp))?;

        let hms_parts: Vec<&str> = hms.split(':').collect();
        if hms_parts.len() != 3 {
            return Err(anyhow!("Invalid time format: {}", timestamp));
        }

        let hours: u64 = hms_parts[0].parse()?;
        let minutes: u64 = hms_parts[1].parse()?;
        let seconds: u64 = hms_parts[2].parse()?;
        let milliseconds: u64 = millis.parse()?;

        let total_seconds = hours * 3600 + minutes * 60 + seconds;
        Ok(Duration::from_millis(total_seconds * 1000 + milliseconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_fenced_block_with_preamble() {
        let raw = "Sure! ```srt\n1\n00:00:01,000 --> 00:00:02,000\nHello\n```";
        let doc = clean_response(raw).unwrap();
        assert_eq!(doc.as_str(), "1\n00:00:01,000 --> 00:00:02,000\nHello");
    }

    #[test]
    fn test_preamble_is_discarded() {
        let raw = "Here are the subtitles:\n1\n00:00:00,500 --> 00:00:01,500\nHi there\n";
        let doc = clean_response(raw).unwrap();
        assert_eq!(doc.as_str(), "1\n00:00:00,500 --> 00:00:01,500\nHi there");
    }

    #[test]
    fn test_refusal_text_has_no_valid_srt() {
        let err = clean_response("I cannot process this audio.").unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoValidSrt);
    }

    #[test]
    fn test_period_millisecond_separator() {
        let raw = "1\n00:00:01.000 --> 00:00:02.000\nDot separated";
        let doc = clean_response(raw).unwrap();
        assert_eq!(doc.as_str(), raw);
    }

    #[test]
    fn test_empty_and_whitespace_responses_fail() {
        assert_eq!(clean_response("").unwrap_err().kind(), FailureKind::NoValidSrt);
        assert_eq!(clean_response("  \n\n ").unwrap_err().kind(), FailureKind::NoValidSrt);
        assert_eq!(clean_response("```srt\n```").unwrap_err().kind(), FailureKind::NoValidSrt);
    }

    #[test]
    fn test_unwrap_markdown_untagged_and_outer_whitespace() {
        let raw = "\n\n  ```\n  1\n00:00:00,000 --> 00:00:01,000\nA\n\n```  \n\n";
        assert_eq!(
            unwrap_markdown(raw).as_deref(),
            Some("1\n00:00:00,000 --> 00:00:01,000\nA")
        );
        assert_eq!(unwrap_markdown("no fences here"), None);
    }

    #[test]
    fn test_unwrap_markdown_uppercase_tag() {
        let raw = "```SRT\n1\n00:00:00,000 --> 00:00:01,000\nA\n```";
        assert_eq!(
            unwrap_markdown(raw).as_deref(),
            Some("1\n00:00:00,000 --> 00:00:01,000\nA")
        );
    }

    #[test]
    fn test_crlf_line_endings_anchor() {
        let raw = "Subtitles:\r\n1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n";
        let doc = clean_response(raw).unwrap();
        assert!(doc.as_str().starts_with("1\r\n00:00:01,000"));
    }

    #[test]
    fn test_stages_are_individually_observable() {
        let stage = CleaningStage::Raw("```srt\nnot subtitles\n```".to_string());
        let unwrapped = stage.advance().unwrap();
        assert_eq!(unwrapped, CleaningStage::MarkdownUnwrapped("not subtitles".to_string()));

        let err = unwrapped.advance().unwrap_err();
        assert_eq!(err.kind(), FailureKind::NoValidSrt);
    }

    #[test]
    fn test_trailing_content_is_kept() {
        let raw = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\nLet me know if you need more!";
        let doc = clean_response(raw).unwrap();
        assert!(doc.as_str().ends_with("Let me know if you need more!"));
    }

    #[test]
    fn test_cues_parsing_is_lenient() {
        let raw = "1\n00:00:01,000 --> 00:00:02,500\nHello\nworld\n\n\
                   2\nbroken timing\nSkipped\n\n\
                   3\n00:00:03.000 --> 00:00:04.000\nBye";
        let doc = clean_response(raw).unwrap();
        let cues = doc.cues();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].index, 1);
        assert_eq!(cues[0].end, Duration::from_millis(2500));
        assert_eq!(cues[0].text, "Hello\nworld");
        assert_eq!(cues[1].index, 3);
        assert_eq!(cues[1].start, Duration::from_secs(3));
        assert_eq!(doc.first_cue().map(|c| c.index), Some(1));
    }

    #[test]
    fn test_cue_display() {
        let cue = SrtCue {
            index: 7,
            start: Duration::from_millis(3_723_004),
            end: Duration::from_millis(3_725_000),
            text: "Line".to_string(),
        };
        assert_eq!(cue.to_string(), "7\n01:02:03,004 --> 01:02:05,000\nLine\n");
    }

    #[test]
    fn test_timestamp_parsing() {
        assert_eq!(
            SrtFormatter::parse_timestamp("00:01:01,250").unwrap(),
            Duration::from_millis(61_250)
        );
        assert_eq!(
            SrtFormatter::parse_timestamp("01:00:00.000").unwrap(),
            Duration::from_secs(3600)
        );
        assert!(SrtFormatter::parse_timestamp("1:00").is_err());
    }

    #[test]
    fn test_suggested_filename() {
        assert_eq!(SrtDocument::suggested_filename(Some("talk"), LanguageMode::Original), "talk.srt");
        assert_eq!(SrtDocument::suggested_filename(Some("talk"), LanguageMode::English), "talk.en.srt");
        assert_eq!(SrtDocument::suggested_filename(None, LanguageMode::Original), "subtitles.srt");
    }

    #[tokio::test]
    async fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.srt");
        let doc = clean_response("1\n00:00:01,000 --> 00:00:02,000\nHello").unwrap();

        doc.save_to_file(&path).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "1\n00:00:01,000 --> 00:00:02,000\nHello\n");
    }
}
