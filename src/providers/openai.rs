//! OpenAI-compatible generation client
//!
//! Workout plans come from `/chat/completions` in JSON mode, speech from
//! `/audio/speech`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::GenerationSettings;
use crate::providers::traits::{
    GenerationProvider, ProviderError, ProviderResult, SpeechRequest, WorkoutRequest,
};

const WORKOUT_SYSTEM_PROMPT: &str = "Eres un entrenador personal certificado. \
Responde únicamente con un objeto JSON con las claves \"title\", \"summary\" y \"sessions\". \
Cada sesión tiene \"day\", \"focus\" y \"exercises\" (lista de objetos con \"name\", \"sets\", \"reps\" y \"rest_seconds\").";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Generation provider backed by an OpenAI-compatible HTTP API
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    speech_model: String,
    voice: String,
}

impl OpenAiProvider {
    pub fn new(settings: &GenerationSettings) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("fitgen-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OpenAiProvider {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            chat_model: settings.chat_model.clone(),
            speech_model: settings.speech_model.clone(),
            voice: settings.voice.clone(),
        })
    }

    fn api_key(&self) -> ProviderResult<&str> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "FITGEN_GENERATION__API_KEY environment variable not set".to_string(),
            ));
        }
        Ok(&self.api_key)
    }

    /// POST a JSON body, failing on non-2xx statuses
    async fn post(&self, path: &str, body: &serde_json::Value) -> ProviderResult<reqwest::Response> {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Generation API request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Ok(response)
    }
}

fn workout_prompt(request: &WorkoutRequest) -> String {
    let equipment = if request.equipment.is_empty() {
        "sin equipo".to_string()
    } else {
        request.equipment.join(", ")
    };
    format!(
        "Crea un plan de entrenamiento. Objetivo: {}. Nivel: {}. Días por semana: {}. \
         Minutos por sesión: {}. Equipo disponible: {}.",
        request.goal.trim(),
        request.level,
        request.days_per_week,
        request.minutes_per_session,
        equipment
    )
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_workout(&self, request: &WorkoutRequest) -> ProviderResult<serde_json::Value> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": WORKOUT_SYSTEM_PROMPT },
                { "role": "user", "content": workout_prompt(request) },
            ],
        });

        let completion: ChatCompletion = self
            .post("/chat/completions", &body)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("completion body: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::ParseError("completion has no content".to_string()))?;

        let workout: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            ProviderError::ParseError(format!(
                "workout JSON: {} - Body: {}",
                e,
                content.chars().take(200).collect::<String>()
            ))
        })?;

        info!(model = %self.chat_model, "Workout generated");
        Ok(workout)
    }

    async fn synthesize_speech(&self, request: &SpeechRequest) -> ProviderResult<Vec<u8>> {
        let voice = request.voice.as_deref().unwrap_or(&self.voice);
        let body = serde_json::json!({
            "model": self.speech_model,
            "voice": voice,
            "input": request.text,
            "response_format": "mp3",
        });

        let audio = self.post("/audio/speech", &body).await?.bytes().await?;

        info!(model = %self.speech_model, voice = %voice, bytes = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}
