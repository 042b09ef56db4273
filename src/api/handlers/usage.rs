//! Quota usage endpoint

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::error::ErrorResponse;
use crate::gate::Identity;
use crate::AppState;

/// Current window usage for the caller
#[derive(Debug, Serialize, ToSchema)]
pub struct UsageResponse {
    pub identity: String,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub window_start: DateTime<Utc>,
    pub resets_at: DateTime<Utc>,
}

/// GET /api/usage - Quota usage (does not consume quota)
#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "usage",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Usage in the current window", body = UsageResponse),
        (status = 401, description = "Token missing", body = ErrorResponse),
        (status = 403, description = "Token invalid or expired", body = ErrorResponse)
    )
)]
pub async fn get_usage(state: web::Data<AppState>, identity: Identity) -> HttpResponse {
    let status = state.gate.tracker().usage_at(&identity.id, Utc::now());

    HttpResponse::Ok().json(UsageResponse {
        identity: identity.id,
        used: status.used,
        limit: status.limit,
        remaining: status.remaining,
        window_start: status.window_start,
        resets_at: status.resets_at,
    })
}
