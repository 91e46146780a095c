use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::ServiceProvider;

/// Configuration for the audio subtitler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote generative service settings
    pub service: ServiceConfig,

    /// Audio ingestion settings
    pub audio: AudioConfig,

    /// Output and logging settings
    pub output: OutputConfig,

    /// HTTP API settings
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service provider
    pub provider: ServiceProvider,

    /// Base URL of the service API
    pub endpoint: String,

    /// API key for the service
    pub api_key: Option<String>,

    /// Model identifier sent with every request
    pub model: String,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_output_tokens: u32,

    /// Request timeout in seconds (None = wait for the service)
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Durations above this many seconds get the long-file hint
    pub long_file_hint_seconds: u64,

    /// Maximum upload size accepted by the HTTP API in bytes
    pub max_upload_bytes: usize,

    /// ffprobe binary used for duration probing
    pub ffprobe_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log level
    pub log_level: String,

    /// Directory for written SRT files (None = next to the input)
    pub srt_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// Listening port
    pub port: u16,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_paths = [
            "audio-subtitler.toml",
            "config/audio-subtitler.toml",
            "/etc/audio-subtitler/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config.with_env_overrides());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config.with_env_overrides())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().with_env_overrides())
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(api_key) = std::env::var("AUDIO_SUBTITLER_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
        {
            self.service.api_key = Some(api_key);
        }

        if let Ok(model) = std::env::var("AUDIO_SUBTITLER_MODEL") {
            self.service.model = model;
        }

        if let Ok(endpoint) = std::env::var("AUDIO_SUBTITLER_ENDPOINT") {
            self.service.endpoint = endpoint;
        }

        if let Ok(log_level) = std::env::var("AUDIO_SUBTITLER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        if let Ok(port) = std::env::var("AUDIO_SUBTITLER_PORT") {
            match port.parse() {
                Ok(port) => self.api.port = port,
                Err(_) => tracing::warn!("Ignoring invalid AUDIO_SUBTITLER_PORT: {}", port),
            }
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.service.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(anyhow!(
                "API key required: set service.api_key or AUDIO_SUBTITLER_API_KEY"
            ));
        }

        if self.service.model.trim().is_empty() {
            return Err(anyhow!("service.model must not be empty"));
        }

        if self.audio.long_file_hint_seconds == 0 {
            return Err(anyhow!("long_file_hint_seconds must be greater than 0"));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Audio Subtitler Configuration:\n\
            - Provider: {:?}\n\
            - Model: {}\n\
            - Endpoint: {}\n\
            - Timeout: {}\n\
            - Long File Hint: {}s\n\
            - API: {}:{}",
            self.service.provider,
            self.service.model,
            self.service.endpoint,
            self.service
                .timeout_seconds
                .map(|t| format!("{}s", t))
                .unwrap_or_else(|| "none".to_string()),
            self.audio.long_file_hint_seconds,
            self.api.host,
            self.api.port,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                provider: ServiceProvider::Gemini,
                endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                temperature: 0.0,
                max_output_tokens: 65536,
                timeout_seconds: None,
            },
            audio: AudioConfig {
                long_file_hint_seconds: 600, // 10 minutes
                max_upload_bytes: 100 * 1024 * 1024,
                ffprobe_path: "ffprobe".to_string(),
            },
            output: OutputConfig {
                log_level: "info".to_string(),
                srt_dir: None,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.service.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.config.service.model = model;
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.config.service.endpoint = endpoint;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.service.timeout_seconds = Some(seconds);
        self
    }

    pub fn with_long_file_hint(mut self, seconds: u64) -> Self {
        self.config.audio.long_file_hint_seconds = seconds;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.api.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
