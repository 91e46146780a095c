use super::LanguageMode;

const FORMAT_RULES: &str = "Format the output strictly as SRT (SubRip):\n\
- Number each subtitle sequentially starting at 1.\n\
- Put the timing on its own line as HH:MM:SS,mmm --> HH:MM:SS,mmm (for example 00:00:01,250 --> 00:00:04,000).\n\
- Follow the timing line with the subtitle text, then a blank line before the next subtitle.\n\
- Keep each subtitle short enough to read comfortably and aligned with when it is spoken.\n\
Return ONLY the SRT content. Do not add any introduction, explanation, notes or commentary, and do not wrap the output in markdown or code fences.";

/// Instruction text sent with the audio for the given mode
pub fn instruction_for(mode: LanguageMode) -> String {
    let task = match mode {
        LanguageMode::Original => {
            "Transcribe the speech in this audio in the language it is spoken in. \
             Do not translate it."
        }
        LanguageMode::English => {
            "Transcribe the speech in this audio and translate it into English. \
             The subtitles must be in English regardless of the spoken language."
        }
    };

    format!("{}\n\n{}", task, FORMAT_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_modes_demand_srt_timestamps() {
        for mode in [LanguageMode::Original, LanguageMode::English] {
            let prompt = instruction_for(mode);
            assert!(prompt.contains("HH:MM:SS,mmm --> HH:MM:SS,mmm"));
            assert!(prompt.contains("Return ONLY the SRT content"));
            assert!(prompt.contains("markdown"));
        }
    }

    #[test]
    fn test_modes_differ_on_translation() {
        let original = instruction_for(LanguageMode::Original);
        let english = instruction_for(LanguageMode::English);

        assert!(original.contains("Do not translate"));
        assert!(english.contains("translate it into English"));
        assert_ne!(original, english);
    }
}
