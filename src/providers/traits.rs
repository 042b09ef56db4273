//! Generation provider contract
//!
//! Protected handlers reach the upstream model service only through
//! `GenerationProvider`, so tests can swap in a canned implementation.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Provider error types
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for workout generation
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WorkoutRequest {
    /// Training goal, e.g. "fuerza" or "perder peso"
    pub goal: String,
    /// Experience level (defaults to "beginner")
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_days")]
    pub days_per_week: u8,
    #[serde(default = "default_minutes")]
    pub minutes_per_session: u16,
    #[serde(default)]
    pub equipment: Vec<String>,
}

fn default_level() -> String {
    "beginner".to_string()
}

fn default_days() -> u8 {
    3
}

fn default_minutes() -> u16 {
    45
}

impl WorkoutRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.goal.trim().is_empty() {
            return Err("goal is required".to_string());
        }
        if !(1..=7).contains(&self.days_per_week) {
            return Err(format!("days_per_week must be between 1 and 7, got {}", self.days_per_week));
        }
        if !(10..=180).contains(&self.minutes_per_session) {
            return Err(format!(
                "minutes_per_session must be between 10 and 180, got {}",
                self.minutes_per_session
            ));
        }
        Ok(())
    }
}

/// Maximum characters accepted for speech synthesis
pub const MAX_SPEECH_CHARS: usize = 4096;

/// Request body for speech synthesis
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpeechRequest {
    pub text: String,
    /// Voice override; the configured default is used when absent
    #[serde(default)]
    pub voice: Option<String>,
}

impl SpeechRequest {
    pub fn validate(&self) -> Result<(), String> {
        let len = self.text.trim().chars().count();
        if len == 0 {
            return Err("text is required".to_string());
        }
        if len > MAX_SPEECH_CHARS {
            return Err(format!("text must be at most {} characters", MAX_SPEECH_CHARS));
        }
        Ok(())
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Generate a workout plan as a JSON document
    async fn generate_workout(&self, request: &WorkoutRequest) -> ProviderResult<serde_json::Value>;

    /// Synthesize speech, returning MP3 bytes
    async fn synthesize_speech(&self, request: &SpeechRequest) -> ProviderResult<Vec<u8>>;
}
