//! FitGen API
//!
//! Workout and speech generation service using Rust + Actix-Web.
//! Every generation request passes an access gate first: a signed bearer
//! credential is verified, then one unit of the caller's daily quota is
//! charged.
//!
//! Quota state lives in process memory. Run a single instance, or swap the
//! usage store for a shared transactional backend before scaling out.

use actix_web::{web, App, HttpServer, middleware};
use chrono::Duration;
use tracing::info;
use tracing_actix_web::TracingLogger;
use std::sync::Arc;
use std::time::Instant;

mod api;
mod config;
mod gate;
mod providers;

use crate::config::Settings;
use crate::gate::{
    AccessGate, CredentialIssuer, CredentialVerifier, InMemoryUsageStore, QuotaPolicy,
    QuotaTracker, SigningKey,
};
use crate::providers::{GenerationProvider, OpenAiProvider};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub issuer: CredentialIssuer,
    pub gate: Arc<AccessGate>,
    pub provider: Arc<dyn GenerationProvider>,
    pub started_at: Instant,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitgen_api=info".parse().unwrap())
                .add_directive("actix_web=info".parse().unwrap())
        )
        .json()
        .init();

    // Load configuration
    let settings = Settings::load().expect("Failed to load configuration");
    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);

    info!(
        "Starting FitGen API v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    // The secret is fixed for the life of the process.
    let key = SigningKey::new(settings.auth.jwt_secret.as_bytes());
    let issuer = CredentialIssuer::new(key.clone(), Duration::days(settings.auth.token_ttl_days));

    let policy = QuotaPolicy {
        max_requests: settings.quota.max_requests_per_day,
        window: Duration::hours(settings.quota.window_hours),
    };
    let gate = Arc::new(AccessGate::new(
        CredentialVerifier::new(key),
        QuotaTracker::new(InMemoryUsageStore::new(), policy),
    ));
    info!(
        cap = policy.max_requests,
        window_hours = settings.quota.window_hours,
        "Access gate initialized"
    );

    let provider: Arc<dyn GenerationProvider> = Arc::new(
        OpenAiProvider::new(&settings.generation)
            .expect("Failed to initialize generation provider")
    );
    if settings.generation.api_key.is_empty() {
        tracing::warn!("No generation API key configured; generation requests will fail");
    }

    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Create shared application state
    let app_state = web::Data::new(AppState {
        settings,
        issuer,
        gate: gate.clone(),
        provider,
        started_at: Instant::now(),
    });

    // Configure and start HTTP server
    HttpServer::new(move || {
        let gate = gate.clone();
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "fitgen-api"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            // Routes; the access gate wraps the protected scopes
            .configure(move |cfg| api::configure_routes(cfg, gate))
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
