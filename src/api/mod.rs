//! API module - HTTP routes and handlers

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;

use actix_web::{guard, web};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::middleware::AccessGateMiddleware;
use crate::api::openapi::ApiDoc;
use crate::gate::AccessGate;

/// Configure all API routes
///
/// `/health`, `/auth/login` and the docs are public. `/auth/me` and
/// `/api/usage` need a valid credential; generation routes also charge the
/// daily quota.
pub fn configure_routes(cfg: &mut web::ServiceConfig, gate: Arc<AccessGate>) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(
            web::scope("/auth")
                .route("/login", web::post().to(handlers::auth::login))
                .service(
                    web::resource("/me")
                        .wrap(AccessGateMiddleware::authenticated(gate.clone()))
                        .route(web::get().to(handlers::auth::me))
                )
        )
        .service(
            web::scope("/api")
                .service(
                    web::resource("/usage")
                        .wrap(AccessGateMiddleware::authenticated(gate.clone()))
                        .route(web::get().to(handlers::usage::get_usage))
                )
                // Charged resources are method-guarded so an unmatched method
                // falls through to 404 before the gate runs.
                .service(
                    web::resource("/workout/generate")
                        .guard(guard::Post())
                        .wrap(AccessGateMiddleware::charged(gate.clone()))
                        .route(web::post().to(handlers::workout::generate_workout))
                )
                .service(
                    web::resource("/speech/generate")
                        .guard(guard::Post())
                        .wrap(AccessGateMiddleware::charged(gate))
                        .route(web::post().to(handlers::speech::generate_speech))
                )
        )
        .route("/health", web::get().to(handlers::health::health_check))
        // Swagger UI and OpenAPI spec
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        http::{header::AUTHORIZATION, StatusCode},
        test, App,
    };
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::time::Instant;

    use crate::api::middleware::{QUOTA_LIMIT, QUOTA_REMAINING, QUOTA_USED};
    use crate::config::Settings;
    use crate::gate::{
        CredentialIssuer, CredentialVerifier, InMemoryUsageStore, QuotaPolicy, QuotaTracker,
        SigningKey,
    };
    use crate::providers::{
        GenerationProvider, ProviderError, ProviderResult, SpeechRequest, WorkoutRequest,
    };
    use crate::AppState;

    /// Canned provider; fails every call when `fail` is set
    struct StubProvider {
        fail: bool,
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn generate_workout(&self, request: &WorkoutRequest) -> ProviderResult<serde_json::Value> {
            if self.fail {
                return Err(ProviderError::ApiError { status: 503, message: "down".to_string() });
            }
            Ok(serde_json::json!({ "title": format!("Plan {}", request.goal), "sessions": [] }))
        }

        async fn synthesize_speech(&self, _request: &SpeechRequest) -> ProviderResult<Vec<u8>> {
            if self.fail {
                return Err(ProviderError::ParseError("bad audio".to_string()));
            }
            Ok(b"ID3".to_vec())
        }
    }

    fn state(cap: u32, fail: bool) -> web::Data<AppState> {
        let key = SigningKey::new("route-test-secret");
        let gate = Arc::new(AccessGate::new(
            CredentialVerifier::new(key.clone()),
            QuotaTracker::new(
                InMemoryUsageStore::new(),
                QuotaPolicy { max_requests: cap, window: Duration::hours(24) },
            ),
        ));

        web::Data::new(AppState {
            settings: Settings::default(),
            issuer: CredentialIssuer::new(key, Duration::days(7)),
            gate,
            provider: Arc::new(StubProvider { fail }),
            started_at: Instant::now(),
        })
    }

    macro_rules! app {
        ($state:expr) => {{
            let state = $state.clone();
            let gate = state.gate.clone();
            test::init_service(
                App::new()
                    .app_data(state)
                    .configure(move |cfg| configure_routes(cfg, gate)),
            )
            .await
        }};
    }

    fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
        (AUTHORIZATION, format!("Bearer {}", token))
    }

    #[actix_web::test]
    async fn test_login_issues_usable_token() {
        let state = state(10, false);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(serde_json::json!({ "email": "a@b.com" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["user"]["email"], "a@b.com");
        let token = body["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(bearer(&token))
            .to_request();
        let me: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["user"]["id"], body["user"]["id"]);
    }

    #[actix_web::test]
    async fn test_login_rejects_invalid_email() {
        let state = state(10, false);
        let app = app!(state);

        for payload in [serde_json::json!({ "email": "not-an-email" }), serde_json::json!({})] {
            let req = test::TestRequest::post().uri("/auth/login").set_json(payload).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["code"], "invalid_input");
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_missing_token_is_401() {
        let state = state(10, false);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/workout/generate")
            .set_json(serde_json::json!({ "goal": "fuerza" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Token requerido");
    }

    #[actix_web::test]
    async fn test_invalid_token_is_403() {
        let state = state(10, false);
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/workout/generate")
            .insert_header(bearer("garbage.token.value"))
            .set_json(serde_json::json!({ "goal": "fuerza" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Token inválido o expirado");
    }

    #[actix_web::test]
    async fn test_token_older_than_seven_days_is_403() {
        let state = state(10, false);
        let app = app!(state);

        let issued = state
            .issuer
            .issue_at("a@b.com", Utc::now() - Duration::days(7) - Duration::minutes(1))
            .unwrap();

        let req = test::TestRequest::get()
            .uri("/auth/me")
            .insert_header(bearer(&issued.token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_generation_charges_quota_until_429() {
        let state = state(2, false);
        let app = app!(state);
        let issued = state.issuer.issue("a@b.com").unwrap();

        for used in 1..=2 {
            let req = test::TestRequest::post()
                .uri("/api/workout/generate")
                .insert_header(bearer(&issued.token))
                .set_json(serde_json::json!({ "goal": "fuerza" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(resp.headers().get(QUOTA_LIMIT).unwrap(), "2");
            assert_eq!(resp.headers().get(QUOTA_USED).unwrap().to_str().unwrap(), used.to_string());
            assert_eq!(
                resp.headers().get(QUOTA_REMAINING).unwrap().to_str().unwrap(),
                (2 - used).to_string()
            );

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["workout"]["title"], "Plan fuerza");
        }

        let req = test::TestRequest::post()
            .uri("/api/speech/generate")
            .insert_header(bearer(&issued.token))
            .set_json(serde_json::json!({ "text": "Vamos" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key("retry-after"));

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "quota_exceeded");
        assert!(body["message"].is_string());

        assert_eq!(state.gate.tracker().record(&issued.identity.id).unwrap().count, 2);
    }

    #[actix_web::test]
    async fn test_usage_does_not_consume_quota() {
        let state = state(10, false);
        let app = app!(state);
        let issued = state.issuer.issue("a@b.com").unwrap();

        let req = test::TestRequest::post()
            .uri("/api/speech/generate")
            .insert_header(bearer(&issued.token))
            .set_json(serde_json::json!({ "text": "Vamos" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), "audio/mpeg");

        for _ in 0..3 {
            let req = test::TestRequest::get()
                .uri("/api/usage")
                .insert_header(bearer(&issued.token))
                .to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["used"], 1);
            assert_eq!(body["remaining"], 9);
        }
    }

    #[actix_web::test]
    async fn test_downstream_failure_is_500_and_still_charged() {
        let state = state(10, true);
        let app = app!(state);
        let issued = state.issuer.issue("a@b.com").unwrap();

        let req = test::TestRequest::post()
            .uri("/api/workout/generate")
            .insert_header(bearer(&issued.token))
            .set_json(serde_json::json!({ "goal": "fuerza" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(state.gate.tracker().record(&issued.identity.id).unwrap().count, 1);
    }

    #[actix_web::test]
    async fn test_unrouted_requests_do_not_charge() {
        let state = state(10, false);
        let app = app!(state);
        let issued = state.issuer.issue("a@b.com").unwrap();

        let requests = [
            test::TestRequest::get().uri("/api/workout/generate"),
            test::TestRequest::put().uri("/api/speech/generate"),
            test::TestRequest::post().uri("/api/speech/anything"),
            test::TestRequest::post().uri("/api/workout"),
        ];
        for req in requests {
            let req = req
                .insert_header(bearer(&issued.token))
                .set_json(serde_json::json!({ "goal": "fuerza", "text": "Vamos" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_client_error());
            assert!(!resp.headers().contains_key(QUOTA_USED));
        }

        assert!(state.gate.tracker().record(&issued.identity.id).is_none());
    }

    #[actix_web::test]
    async fn test_invalid_payload_is_400() {
        let state = state(10, false);
        let app = app!(state);
        let issued = state.issuer.issue("a@b.com").unwrap();

        let req = test::TestRequest::post()
            .uri("/api/workout/generate")
            .insert_header(bearer(&issued.token))
            .set_json(serde_json::json!({ "goal": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "invalid_request");
    }

    #[actix_web::test]
    async fn test_health_is_public() {
        let state = state(10, false);
        let app = app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }
}
