//! API data models

use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, TranscriptionError};

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub kind: Option<FailureKind>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    /// Failure carrying only the user-facing sentence, never the diagnostic
    pub fn failure(err: &TranscriptionError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.user_message().to_string()),
            kind: Some(err.kind()),
        }
    }
}

/// Health check payload
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub timestamp: String,
}
