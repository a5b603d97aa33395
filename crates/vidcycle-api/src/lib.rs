//! vidcycle-api - HTTP API server for vidcycle

pub mod error;
pub mod handlers;
pub mod identity;
pub mod logging;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use vidcycle_core::Repositories;
use vidcycle_jobs::LifecycleEngine;

pub use error::ApiError;

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: LifecycleEngine,
    pub repos: Repositories,
    /// Shared secret expected from the cleanup scheduler.
    pub cron_secret: Option<String>,
}

/// Parse allowed CORS origins from `ALLOWED_ORIGINS` (comma-separated).
///
/// Defaults to `http://localhost:3000` when unset or empty.
pub fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS").unwrap_or_default();

    if origins_str.trim().is_empty() {
        return vec![HeaderValue::from_static("http://localhost:3000")];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

/// Build the router with every endpoint and the middleware stack.
pub fn router(state: AppState) -> Router {
    use handlers::{admin, classify, cron, health, labels, videos};

    Router::new()
        .route("/health", get(health::health))
        .route("/classify", post(classify::classify))
        .route("/labels", get(labels::list_labels).post(labels::create_label))
        .route("/labels/:id", delete(labels::deactivate_label))
        .route(
            "/videos/:id/labels",
            get(videos::get_video_labels).post(videos::set_video_labels),
        )
        .route(
            "/cron/cleanup-expired-videos",
            get(cron::cleanup_expired_videos),
        )
        .route(
            "/admin/classify-all-videos",
            post(admin::classify_all_videos),
        )
        // Middleware
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parse_allowed_origins()))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(identity::USER_ID_HEADER),
                    HeaderName::from_static(identity::ORGANIZATION_ID_HEADER),
                ])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
