mod common;

use audio_subtitler::{
    AudioIngestor, AudioInput, FailureKind, LanguageMode, SubtitleGenerator, SubtitleSession,
};
use common::{Scripted, StubService};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const ORIGINAL_SRT: &str = "1\n00:00:00,000 --> 00:00:01,000\nHola";
const ENGLISH_SRT: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello";

fn setup(script: Vec<Scripted>) -> (SubtitleSession, SubtitleGenerator, Arc<StubService>) {
    let service = Arc::new(StubService::new(script));
    let generator = SubtitleGenerator::new(service.clone());
    let input = AudioInput::from_bytes(b"audio".to_vec(), "audio/webm", Some("recording.webm".into()));
    (SubtitleSession::new(input, LanguageMode::Original), generator, service)
}

#[tokio::test]
async fn test_switch_mode_regenerates() {
    let (mut session, generator, service) =
        setup(vec![Scripted::text(ORIGINAL_SRT), Scripted::text(ENGLISH_SRT)]);
    let ingestor = AudioIngestor::new();

    let first = assert_ok!(session.generate(&generator, &ingestor).await);
    assert_eq!(first.as_str(), ORIGINAL_SRT);

    let second = assert_ok!(
        session
            .switch_mode(LanguageMode::English, &generator, &ingestor)
            .await
    );
    assert_eq!(second.as_str(), ENGLISH_SRT);
    assert_eq!(session.mode(), LanguageMode::English);
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_failed_switch_reverts_mode_and_keeps_document() {
    let (mut session, generator, _) = setup(vec![
        Scripted::text(ORIGINAL_SRT),
        Scripted::Fail(FailureKind::ServiceError, "503 overloaded"),
    ]);
    let ingestor = AudioIngestor::new();

    assert_ok!(session.generate(&generator, &ingestor).await);

    let err = assert_err!(
        session
            .switch_mode(LanguageMode::English, &generator, &ingestor)
            .await
    );
    assert_eq!(err.kind(), FailureKind::ServiceError);
    assert_eq!(session.mode(), LanguageMode::Original);
    assert_eq!(session.document().map(|d| d.as_str()), Some(ORIGINAL_SRT));
}

#[tokio::test]
async fn test_switch_to_current_mode_reuses_document() {
    let (mut session, generator, service) = setup(vec![Scripted::text(ORIGINAL_SRT)]);
    let ingestor = AudioIngestor::new();

    assert_ok!(session.generate(&generator, &ingestor).await);
    assert_ok!(
        session
            .switch_mode(LanguageMode::Original, &generator, &ingestor)
            .await
    );

    assert_eq!(service.call_count(), 1);
}

#[tokio::test]
async fn test_select_mode_before_first_generation() {
    let (mut session, generator, service) = setup(vec![Scripted::text(ENGLISH_SRT)]);
    let ingestor = AudioIngestor::new();

    session.select_mode(LanguageMode::English);
    assert!(session.document().is_none());

    assert_ok!(session.generate(&generator, &ingestor).await);
    assert_eq!(
        service.calls.lock().unwrap()[0].instruction,
        audio_subtitler::transcription::prompts::instruction_for(LanguageMode::English)
    );
}

#[tokio::test]
async fn test_failed_first_generation_leaves_no_document() {
    let (mut session, generator, _) = setup(vec![Scripted::safety(None)]);
    let ingestor = AudioIngestor::new();

    let err = assert_err!(session.generate(&generator, &ingestor).await);
    assert_eq!(err.kind(), FailureKind::SafetyBlocked);
    assert!(session.document().is_none());
}

#[tokio::test]
async fn test_failed_generate_after_select_mode_restores_displayed_mode() {
    let (mut session, generator, _) = setup(vec![
        Scripted::text(ORIGINAL_SRT),
        Scripted::Fail(FailureKind::ServiceError, "503 overloaded"),
    ]);
    let ingestor = AudioIngestor::new();

    assert_ok!(session.generate(&generator, &ingestor).await);

    session.select_mode(LanguageMode::English);
    let err = assert_err!(session.generate(&generator, &ingestor).await);

    assert_eq!(err.kind(), FailureKind::ServiceError);
    assert_eq!(session.mode(), LanguageMode::Original);
    assert_eq!(session.document_mode(), Some(LanguageMode::Original));
    assert_eq!(session.document().map(|d| d.as_str()), Some(ORIGINAL_SRT));
}

#[tokio::test]
async fn test_generate_after_select_mode_tracks_document_mode() {
    let (mut session, generator, _) =
        setup(vec![Scripted::text(ORIGINAL_SRT), Scripted::text(ENGLISH_SRT)]);
    let ingestor = AudioIngestor::new();

    assert_ok!(session.generate(&generator, &ingestor).await);
    session.select_mode(LanguageMode::English);
    let document = assert_ok!(session.generate(&generator, &ingestor).await);

    assert_eq!(document.as_str(), ENGLISH_SRT);
    assert_eq!(session.mode(), LanguageMode::English);
    assert_eq!(session.document_mode(), Some(LanguageMode::English));
}

#[tokio::test]
async fn test_failed_first_switch_restores_selected_mode() {
    let (mut session, generator, service) =
        setup(vec![Scripted::text("I cannot transcribe this.")]);
    let ingestor = AudioIngestor::new();

    let err = assert_err!(
        session
            .switch_mode(LanguageMode::English, &generator, &ingestor)
            .await
    );

    assert_eq!(err.kind(), FailureKind::NoValidSrt);
    assert_eq!(session.mode(), LanguageMode::Original);
    assert_eq!(session.document_mode(), None);
    assert_eq!(service.call_count(), 1);
}
