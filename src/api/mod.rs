//! HTTP API for the audio subtitler
//!
//! Exposes the single caller-facing operation (audio + language in, SRT out) over HTTP.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

pub mod handlers;
pub mod models;
pub mod server;

/// API Server for handling subtitle requests
#[derive(Debug)]
pub struct ApiServer {
    config: Arc<Config>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<()> {
        info!(
            "🚀 Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );
        server::start_http_server(self.config).await
    }
}
