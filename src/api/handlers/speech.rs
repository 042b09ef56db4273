//! Speech synthesis endpoint

use actix_web::{web, HttpResponse};
use tracing::{error, info, warn};

use crate::api::error::ErrorResponse;
use crate::gate::Identity;
use crate::providers::SpeechRequest;
use crate::AppState;

/// POST /api/speech/generate - Synthesize speech as MP3
#[utoipa::path(
    post,
    path = "/api/speech/generate",
    tag = "generation",
    security(("bearer" = [])),
    request_body = SpeechRequest,
    responses(
        (status = 200, description = "MP3 audio (audio/mpeg)"),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Token missing", body = ErrorResponse),
        (status = 403, description = "Token invalid or expired", body = ErrorResponse),
        (status = 429, description = "Daily quota exceeded", body = ErrorResponse),
        (status = 500, description = "Synthesis failed", body = ErrorResponse)
    )
)]
pub async fn generate_speech(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<SpeechRequest>,
) -> HttpResponse {
    if let Err(e) = body.validate() {
        warn!(identity = %identity.id, error = %e, "Invalid speech request");
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("Solicitud inválida", "invalid_request").with_message(e));
    }

    match state.provider.synthesize_speech(&body).await {
        Ok(audio) => {
            info!(identity = %identity.id, bytes = audio.len(), "Speech generated successfully");
            HttpResponse::Ok().content_type("audio/mpeg").body(audio)
        }
        Err(e) => {
            error!(identity = %identity.id, error = %e, "Speech generation failed");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Error al generar el audio", "generation_failed"))
        }
    }
}
