//! OpenAPI 3.0 specification definition

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::error::ErrorResponse;
use crate::api::handlers::{
    auth::{LoginRequest, LoginResponse, MeResponse},
    health::HealthResponse,
    usage::UsageResponse,
    workout::WorkoutResponse,
};
use crate::gate::Identity;
use crate::providers::{SpeechRequest, WorkoutRequest};

/// Registers the `bearer` security scheme used by protected routes
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FitGen API",
        version = "1.0.0",
        description = "Workout and speech generation behind signed credentials and a daily quota",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "auth", description = "Credential issuance"),
        (name = "usage", description = "Daily quota usage"),
        (name = "generation", description = "Quota-charged generation endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::me,
        crate::api::handlers::usage::get_usage,
        crate::api::handlers::workout::generate_workout,
        crate::api::handlers::speech::generate_speech,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponse,
            MeResponse,
            Identity,
            UsageResponse,
            WorkoutRequest,
            WorkoutResponse,
            SpeechRequest,
            ErrorResponse,
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_gate_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/api/workout/generate"));
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer"))
            .unwrap_or(false));
    }
}
