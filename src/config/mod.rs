//! Configuration module for the generation gateway

use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};
use std::path::PathBuf;

use crate::gate::{DEFAULT_CREDENTIAL_TTL_DAYS, MAX_REQUESTS_PER_DAY};

/// Upper bound for `auth.token_ttl_days` (ten years)
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Upper bound for `quota.window_hours` (one leap year)
const MAX_WINDOW_HOURS: i64 = 24 * 366;

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub quota: QuotaSettings,
    pub generation: GenerationSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Credential signing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Shared HMAC secret used to sign and verify credentials
    pub jwt_secret: String,
    pub token_ttl_days: i64,
}

/// Per-identity daily quota
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaSettings {
    pub max_requests_per_day: u32,
    pub window_hours: i64,
}

/// Upstream generation provider (OpenAI-compatible API)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub speech_model: String,
    pub voice: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// Load configuration from files and environment variables
    ///
    /// Configuration priority (highest to lowest):
    /// 1. Environment variables (prefixed with FITGEN_)
    /// 2. config/local.toml (gitignored)
    /// 3. config/default.toml
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let defaults = Settings::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.token_ttl_days", defaults.auth.token_ttl_days)?
            .set_default("quota.max_requests_per_day", i64::from(defaults.quota.max_requests_per_day))?
            .set_default("quota.window_hours", defaults.quota.window_hours)?
            .set_default("generation.base_url", defaults.generation.base_url)?
            .set_default("generation.api_key", defaults.generation.api_key)?
            .set_default("generation.chat_model", defaults.generation.chat_model)?
            .set_default("generation.speech_model", defaults.generation.speech_model)?
            .set_default("generation.voice", defaults.generation.voice)?
            .set_default("generation.timeout_secs", defaults.generation.timeout_secs as i64)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local overrides (gitignored)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment variables (FITGEN_AUTH__JWT_SECRET, etc.)
            .add_source(
                Environment::with_prefix("FITGEN")
                    .separator("__")
                    .try_parsing(true)
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the gate cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (FITGEN_AUTH__JWT_SECRET)".to_string(),
            ));
        }
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&self.auth.token_ttl_days) {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_days must be between 1 and {}",
                MAX_TOKEN_TTL_DAYS
            )));
        }
        if !(1..=MAX_WINDOW_HOURS).contains(&self.quota.window_hours) {
            return Err(ConfigError::Message(format!(
                "quota.window_hours must be between 1 and {}",
                MAX_WINDOW_HOURS
            )));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                workers: None,
            },
            auth: AuthSettings {
                jwt_secret: String::new(),
                token_ttl_days: DEFAULT_CREDENTIAL_TTL_DAYS,
            },
            quota: QuotaSettings {
                max_requests_per_day: MAX_REQUESTS_PER_DAY,
                window_hours: 24,
            },
            generation: GenerationSettings {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                chat_model: "gpt-4o-mini".to_string(),
                speech_model: "tts-1".to_string(),
                voice: "alloy".to_string(),
                timeout_secs: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_daily_policy() {
        let settings = Settings::default();
        assert_eq!(settings.quota.max_requests_per_day, 10);
        assert_eq!(settings.quota.window_hours, 24);
        assert_eq!(settings.auth.token_ttl_days, 7);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_configured_secret_accepted() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "s3cret".to_string();
        assert!(settings.validate().is_ok());

        settings.quota.window_hours = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let mut settings = Settings::default();
        settings.auth.jwt_secret = "s3cret".to_string();

        settings.auth.token_ttl_days = MAX_TOKEN_TTL_DAYS;
        settings.quota.window_hours = MAX_WINDOW_HOURS;
        assert!(settings.validate().is_ok());

        settings.auth.token_ttl_days = 10_000_000_000_000;
        assert!(settings.validate().is_err());

        settings.auth.token_ttl_days = DEFAULT_CREDENTIAL_TTL_DAYS;
        settings.quota.window_hours = i64::MAX;
        assert!(settings.validate().is_err());
    }
}
