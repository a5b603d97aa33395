//! Label catalog endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use vidcycle_core::{CreateLabelRequest, Label};

use crate::error::ApiError;
use crate::identity::{Actor, Organization};
use crate::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ListLabelsResponse {
    pub labels: Vec<Label>,
}

/// List the organization's active labels, seeding the system vocabulary first if needed.
pub async fn list_labels(
    State(state): State<AppState>,
    Organization(organization_id): Organization,
) -> Result<Json<ListLabelsResponse>, ApiError> {
    state
        .engine
        .catalog
        .seed_system_labels(organization_id)
        .await?;
    let labels = state
        .engine
        .catalog
        .list_active_labels(organization_id)
        .await?;
    Ok(Json(ListLabelsResponse { labels }))
}

/// Create a custom label and queue it for promotion in the background.
pub async fn create_label(
    State(state): State<AppState>,
    Organization(organization_id): Organization,
    Actor(actor_id): Actor,
    Json(body): Json<CreateLabelRequest>,
) -> Result<(StatusCode, Json<Label>), ApiError> {
    let label = state
        .engine
        .catalog
        .create_custom_label(organization_id, body)
        .await?;

    info!(
        subsystem = "api",
        op = "create_label",
        %organization_id,
        %actor_id,
        label = %label.name,
        "Custom label created"
    );
    state.engine.promotion.spawn_for_label(label.clone());

    Ok((StatusCode::CREATED, Json(label)))
}

/// Soft-delete a label.
pub async fn deactivate_label(
    State(state): State<AppState>,
    Organization(organization_id): Organization,
    Actor(_actor): Actor,
    Path(label_id): Path<Uuid>,
) -> Result<Json<Label>, ApiError> {
    let label = state
        .engine
        .catalog
        .deactivate_label(organization_id, label_id)
        .await?;
    Ok(Json(label))
}
