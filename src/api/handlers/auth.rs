//! Credential issuance and profile endpoints

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::api::error::ErrorResponse;
use crate::gate::{GateError, Identity};
use crate::AppState;

/// Request body for login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

/// Issued credential
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: Identity,
    /// Bearer token for protected routes
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: Identity,
}

/// POST /auth/login - Issue a credential for a self-asserted email
///
/// No ownership check is made on the email.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credential issued", body = LoginResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, GateError> {
    let issued = state.issuer.issue(&body.email).map_err(|e| {
        warn!(error = %e, "Login rejected");
        GateError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: issued.identity,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// GET /auth/me - Identity behind the presented credential
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Verified identity", body = MeResponse),
        (status = 401, description = "Token missing", body = ErrorResponse),
        (status = 403, description = "Token invalid or expired", body = ErrorResponse)
    )
)]
pub async fn me(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse { user: identity })
}
