use anyhow::{anyhow, Result};
use audio_subtitler::{
    AudioIngestor, AudioInput, Config, LanguageMode, SrtDocument, SubtitleGenerator,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Generate SubRip subtitles for an audio file
#[derive(Debug, Parser)]
#[command(name = "audio-subtitler", version, author = "TigreRoll")]
struct Cli {
    /// Audio file to transcribe
    audio_file: Option<PathBuf>,

    /// Translate the subtitles into English
    #[arg(short, long)]
    english: bool,

    /// Where to write the SRT file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the MIME type guessed from the file extension
    #[arg(long, value_name = "TYPE")]
    mime: Option<String>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Serve the HTTP API instead of processing a file
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = if cli.verbose { "debug" } else { config.output.log_level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("audio_subtitler={},warn", level))),
        )
        .init();

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    config.validate()?;
    info!("🚀 Audio Subtitler starting...");
    tracing::debug!("{}", config.summary());

    #[cfg(feature = "api")]
    if cli.serve {
        audio_subtitler::api::ApiServer::new(config).start().await?;
        return Ok(ExitCode::SUCCESS);
    }

    let audio_file = cli
        .audio_file
        .ok_or_else(|| anyhow!("An audio file is required"))?;
    let generator = SubtitleGenerator::from_config(&config.service)?;
    let ingestor = AudioIngestor::from_config(&config.audio);
    let mode = if cli.english {
        LanguageMode::English
    } else {
        LanguageMode::Original
    };

    let input = AudioInput::from_path(&audio_file, cli.mime);
    info!("📁 Input: {} ({})", audio_file.display(), input.mime_type());

    let duration = ingestor.probe_duration(&input).await;
    if ingestor.is_long(duration) {
        warn!(
            "⏱️  This recording is {:.0} minutes long; generating subtitles may take a while",
            duration.as_secs_f64() / 60.0
        );
    }

    let document = match generator.generate_from_input(&ingestor, &input, mode).await {
        Ok(document) => document,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let output = cli.output.unwrap_or_else(|| {
        let filename = SrtDocument::suggested_filename(input.stem().as_deref(), mode);
        match &config.output.srt_dir {
            Some(dir) => dir.join(filename),
            None => audio_file.with_file_name(filename),
        }
    });

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    document.save_to_file(&output).await?;

    info!(
        "✅ Wrote {} cues to {}",
        document.cues().len(),
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}
