use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::auth::JwksCache;
use crate::config::Settings;
use crate::middleware::request_id::X_REQUEST_ID;
use crate::middleware::request_id_layer;
use crate::routes;
use crate::services::{ActivityRecorder, BidService, RedisCache, ReportService, TeamService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub settings: Settings,
    pub jwks_cache: JwksCache,
    pub cache: RedisCache,
    pub activity: ActivityRecorder,
    pub bids: BidService,
    pub teams: TeamService,
    pub reports: ReportService,
}

impl AppState {
    /// Wires the services once at startup.
    pub fn new(db: PgPool, settings: Settings, jwks_cache: JwksCache, cache: RedisCache) -> Arc<Self> {
        let activity = ActivityRecorder::new(db.clone());
        let bids = BidService::new(db.clone(), cache.clone(), activity.clone());
        let teams = TeamService::new(db.clone(), cache.clone(), activity.clone());
        let reports = ReportService::new(db.clone(), cache.clone(), activity.clone());

        Arc::new(Self {
            db,
            settings,
            jwks_cache,
            cache,
            activity,
            bids,
            teams,
            reports,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.settings);

    // Spans at DEBUG; handlers log their own INFO events
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    let (set_request_id, propagate_request_id) = request_id_layer();

    Router::new()
        .merge(routes::api_router())
        // Middleware stack (applied bottom-up)
        .layer(propagate_request_id)
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(RequestBodyLimitLayer::new(state.settings.max_body_bytes))
        .layer(cors)
        .with_state(state)
}

/// Explicit origins only; `*` cannot be combined with credentials.
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    let preflight_secs = if settings.env.is_dev() { 86_400 } else { 3_600 };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(X_REQUEST_ID),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(preflight_secs))
}
