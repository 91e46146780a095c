pub mod generator;
pub mod prompts;
pub mod session;
pub mod srt;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use generator::SubtitleGenerator;
pub use session::SubtitleSession;
pub use srt::{clean_response, CleaningStage, SrtCue, SrtDocument, SrtFormatter};

/// Language of the produced subtitles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    /// Keep the language spoken in the audio
    #[default]
    Original,
    /// Translate to English
    English,
}

impl LanguageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageMode::Original => "original",
            LanguageMode::English => "english",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "original" | "orig" | "source" => Ok(LanguageMode::Original),
            "english" | "en" => Ok(LanguageMode::English),
            other => Err(format!("unknown language mode: {}", other)),
        }
    }
}
