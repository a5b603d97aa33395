//! On-demand classification of one video.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use vidcycle_jobs::VideoClassification;

use crate::error::ApiError;
use crate::identity::Actor;
use crate::AppState;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ClassifyRequest {
    #[serde(alias = "videoId")]
    pub video_id: Uuid,
}

/// Classify the video and auto-assign confident labels.
///
/// A classification the oracle could not produce is returned with
/// `502 Bad Gateway` and the structured failure in the body.
pub async fn classify(
    State(state): State<AppState>,
    Actor(actor_id): Actor,
    Json(body): Json<ClassifyRequest>,
) -> Result<(StatusCode, Json<VideoClassification>), ApiError> {
    let video = state.repos.videos.get(body.video_id).await?;
    state
        .engine
        .catalog
        .seed_system_labels(video.organization_id)
        .await?;

    let outcome = state
        .engine
        .pipeline
        .classify_video(video.id, actor_id)
        .await?;

    let status = if outcome.classification.is_success() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    Ok((status, Json(outcome)))
}
