//! Per-video assignment endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use vidcycle_jobs::{LabelUpdate, VideoLabels};

use crate::error::ApiError;
use crate::identity::Actor;
use crate::AppState;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateVideoLabelsBody {
    #[serde(alias = "labelIds")]
    pub label_ids: Vec<Uuid>,
    #[serde(default, alias = "keepPermanently")]
    pub keep_permanently: Option<bool>,
}

pub async fn get_video_labels(
    State(state): State<AppState>,
    Actor(_actor): Actor,
    Path(video_id): Path<Uuid>,
) -> Result<Json<VideoLabels>, ApiError> {
    Ok(Json(state.engine.assignments.video_labels(video_id).await?))
}

/// Replace the video's labels and keep flag; the response carries the new expiration.
pub async fn set_video_labels(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Path(video_id): Path<Uuid>,
    Json(body): Json<UpdateVideoLabelsBody>,
) -> Result<Json<VideoLabels>, ApiError> {
    let update = LabelUpdate {
        label_ids: body.label_ids,
        keep_permanently: body.keep_permanently,
    };
    let labels = state
        .engine
        .assignments
        .set_video_labels(video_id, update, actor_id)
        .await?;
    Ok(Json(labels))
}
