//! Admin batch operations.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vidcycle_jobs::BatchReport;

use crate::error::ApiError;
use crate::identity::Actor;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ClassifyAllQuery {
    #[serde(default, rename = "dryRun", alias = "dry_run")]
    pub dry_run: bool,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Classify every transcript-complete video that was never classified.
pub async fn classify_all_videos(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Query(query): Query<ClassifyAllQuery>,
) -> Result<Json<BatchReport>, ApiError> {
    if !state.engine.config.is_admin(actor_id) {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    info!(
        subsystem = "api",
        op = "classify_all_videos",
        %actor_id,
        dry_run = query.dry_run,
        limit = ?query.limit,
        "Batch classification requested"
    );
    let report = state
        .engine
        .pipeline
        .classify_unclassified(query.limit, query.dry_run, actor_id)
        .await?;
    Ok(Json(report))
}
