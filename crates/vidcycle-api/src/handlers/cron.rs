//! Scheduled job triggers.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use vidcycle_jobs::CleanupReport;

use crate::error::ApiError;
use crate::identity::verify_cron_secret;
use crate::AppState;

/// Delete every expired video. Called daily by the external scheduler.
pub async fn cleanup_expired_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CleanupReport>, ApiError> {
    verify_cron_secret(&headers, state.cron_secret.as_deref())?;
    let report = state.engine.cleanup.run(Utc::now()).await?;
    Ok(Json(report))
}
