use tracing::{info, warn};

use super::generator::SubtitleGenerator;
use super::srt::SrtDocument;
use super::LanguageMode;
use crate::audio::{AudioIngestor, AudioInput};
use crate::error::{Result, TranscriptionError};

/// Caller-side state for one piece of audio.
///
/// Attempts take `&mut self`, so a session can never have two generations in
/// flight. A failed attempt restores the mode of the displayed document.
#[derive(Debug, Clone)]
pub struct SubtitleSession {
    input: AudioInput,
    mode: LanguageMode,
    document: Option<(LanguageMode, SrtDocument)>,
}

impl SubtitleSession {
    pub fn new(input: AudioInput, mode: LanguageMode) -> Self {
        Self {
            input,
            mode,
            document: None,
        }
    }

    pub fn input(&self) -> &AudioInput {
        &self.input
    }

    pub fn mode(&self) -> LanguageMode {
        self.mode
    }

    /// Last successfully generated document
    pub fn document(&self) -> Option<&SrtDocument> {
        self.document.as_ref().map(|(_, document)| document)
    }

    /// Mode the displayed document was generated in
    pub fn document_mode(&self) -> Option<LanguageMode> {
        self.document.as_ref().map(|(mode, _)| *mode)
    }

    /// Change the mode without generating, e.g. before the first attempt
    pub fn select_mode(&mut self, mode: LanguageMode) {
        self.mode = mode;
    }

    /// Generate subtitles in the current mode.
    ///
    /// If the attempt fails while an earlier document is displayed, the mode
    /// goes back to the one that document was generated in.
    pub async fn generate(
        &mut self,
        generator: &SubtitleGenerator,
        ingestor: &AudioIngestor,
    ) -> Result<&SrtDocument> {
        let requested = self.mode;

        match generator.generate_from_input(ingestor, &self.input, requested).await {
            Ok(document) => {
                if let Some(previous) = self.document_mode().filter(|mode| *mode != requested) {
                    info!("🔁 Switched subtitles from {} to {}", previous, requested);
                }
                let (_, document) = self.document.insert((requested, document));
                Ok(&*document)
            }
            Err(e) => {
                if let Some(shown) = self.document_mode() {
                    if shown != requested {
                        warn!("Reverting language mode to {} after failed attempt: {}", shown, e);
                        self.mode = shown;
                    }
                }
                Err(e)
            }
        }
    }

    /// Switch language and regenerate.
    ///
    /// On failure the previous mode and document stay in place. Switching to
    /// the mode already displayed reuses the existing document.
    pub async fn switch_mode(
        &mut self,
        mode: LanguageMode,
        generator: &SubtitleGenerator,
        ingestor: &AudioIngestor,
    ) -> Result<&SrtDocument> {
        if self.document_mode() == Some(mode) {
            self.mode = mode;
            return self
                .document()
                .ok_or_else(|| TranscriptionError::no_valid_srt("No subtitles have been generated"));
        }

        let previous = self.mode;
        self.mode = mode;

        let failure = match self.generate(generator, ingestor).await {
            Ok(_) => None,
            Err(e) => Some(e),
        };
        if let Some(e) = failure {
            // generate() already restored the mode when a document is displayed
            if self.document.is_none() {
                self.mode = previous;
            }
            return Err(e);
        }

        self.document()
            .ok_or_else(|| TranscriptionError::no_valid_srt("No subtitles have been generated"))
    }
}
