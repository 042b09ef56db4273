//! Workout generation endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::api::error::ErrorResponse;
use crate::gate::Identity;
use crate::providers::WorkoutRequest;
use crate::AppState;

/// Generated plan as returned by the provider
#[derive(Serialize, ToSchema)]
pub struct WorkoutResponse {
    #[schema(value_type = Object)]
    pub workout: serde_json::Value,
    pub generation_time_ms: u64,
}

/// POST /api/workout/generate - Generate a workout plan
#[utoipa::path(
    post,
    path = "/api/workout/generate",
    tag = "generation",
    security(("bearer" = [])),
    request_body = WorkoutRequest,
    responses(
        (status = 200, description = "Workout generated", body = WorkoutResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Token missing", body = ErrorResponse),
        (status = 403, description = "Token invalid or expired", body = ErrorResponse),
        (status = 429, description = "Daily quota exceeded", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_workout(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<WorkoutRequest>,
) -> HttpResponse {
    let start = Instant::now();

    if let Err(e) = body.validate() {
        warn!(identity = %identity.id, error = %e, "Invalid workout request");
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("Solicitud inválida", "invalid_request").with_message(e));
    }

    info!(
        identity = %identity.id,
        goal = %body.goal,
        provider = state.provider.name(),
        "Processing workout generation request"
    );

    match state.provider.generate_workout(&body).await {
        Ok(workout) => {
            let elapsed = start.elapsed().as_millis() as u64;
            info!(identity = %identity.id, generation_time_ms = elapsed, "Workout generated successfully");

            HttpResponse::Ok().json(WorkoutResponse {
                workout,
                generation_time_ms: elapsed,
            })
        }
        Err(e) => {
            error!(identity = %identity.id, error = %e, "Workout generation failed");
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Error al generar el entrenamiento", "generation_failed"))
        }
    }
}
