//! HTTP translation of gate failures
//!
//! The single place where `GateError` kinds become status codes and JSON
//! bodies. Every body carries a human-readable `error` and a stable `code`.

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::gate::GateError;

pub const RETRY_AFTER: &str = "Retry-After";

/// Error body shared by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Machine-stable error code
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Render malformed JSON bodies in the shared error shape
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(
        ErrorResponse::new("Solicitud inválida", "invalid_request").with_message(err.to_string()),
    );
    actix_web::error::InternalError::from_response(err, response).into()
}

impl GateError {
    /// Machine-stable error code
    pub fn code(&self) -> &'static str {
        match self {
            GateError::InvalidInput(_) => "invalid_input",
            GateError::MissingCredential => "missing_credential",
            GateError::InvalidOrExpiredCredential => "invalid_credential",
            GateError::UnauthenticatedQuotaCheck => "unauthenticated",
            GateError::QuotaExceeded { .. } => "quota_exceeded",
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            GateError::InvalidInput(_) => "Email inválido",
            GateError::MissingCredential => "Token requerido",
            GateError::InvalidOrExpiredCredential => "Token inválido o expirado",
            GateError::UnauthenticatedQuotaCheck => "Usuario no autenticado",
            GateError::QuotaExceeded { .. } => "Límite de uso diario alcanzado",
        }
    }
}

impl ResponseError for GateError {
    fn status_code(&self) -> StatusCode {
        match self {
            GateError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GateError::MissingCredential | GateError::UnauthenticatedQuotaCheck => {
                StatusCode::UNAUTHORIZED
            }
            GateError::InvalidOrExpiredCredential => StatusCode::FORBIDDEN,
            GateError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        match self {
            GateError::QuotaExceeded { limit, resets_at } => {
                let retry_after = (*resets_at - Utc::now()).num_seconds().max(1);
                builder
                    .insert_header((RETRY_AFTER, retry_after.to_string()))
                    .json(serde_json::json!({
                        "error": self.client_message(),
                        "code": self.code(),
                        "message": format!(
                            "Has alcanzado el máximo de {} solicitudes por día. Intenta de nuevo más tarde.",
                            limit
                        ),
                        "limit": limit,
                        "reset_at": resets_at.to_rfc3339(),
                        "retry_after_seconds": retry_after
                    }))
            }
            _ => builder.json(ErrorResponse::new(self.client_message(), self.code())),
        }
    }
}
