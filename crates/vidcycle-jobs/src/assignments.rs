//! User-facing assignment changes and retention refresh.
//!
//! Every path that changes a video's assignments or its keep flag ends in
//! [`refresh_expiration`], so `expires_at` never drifts from the labels.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use vidcycle_core::{
    expiration_for_assignments, AssignedLabel, Error, NewAssignment, Repositories, Result,
};

/// Recompute `expires_at` from the current assignments and persist it.
pub async fn refresh_expiration(
    repos: &Repositories,
    video_id: Uuid,
) -> Result<Option<DateTime<Utc>>> {
    let video = repos.videos.get(video_id).await?;
    let assigned = repos.assignments.list_for_video(video_id).await?;
    let expires_at = expiration_for_assignments(&video, &assigned);

    if expires_at != video.expires_at {
        repos.videos.set_expiration(video_id, expires_at).await?;
        debug!(
            subsystem = "jobs",
            component = "retention",
            %video_id,
            previous = ?video.expires_at,
            expires_at = ?expires_at,
            "Expiration updated"
        );
    }
    Ok(expires_at)
}

/// A video's labels together with its lifecycle state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoLabels {
    pub video_id: Uuid,
    pub labels: Vec<AssignedLabel>,
    pub keep_permanently: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Desired assignment state submitted by a user.
#[derive(Debug, Clone, Default)]
pub struct LabelUpdate {
    pub label_ids: Vec<Uuid>,
    pub keep_permanently: Option<bool>,
}

/// Reads and reconciles video assignments on behalf of users.
#[derive(Clone)]
pub struct AssignmentService {
    repos: Repositories,
}

impl AssignmentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn video_labels(&self, video_id: Uuid) -> Result<VideoLabels> {
        let video = self.repos.videos.get(video_id).await?;
        let labels = self.repos.assignments.list_for_video(video_id).await?;
        Ok(VideoLabels {
            video_id,
            labels,
            keep_permanently: video.keep_permanently,
            expires_at: video.expires_at,
        })
    }

    /// Make the video's assignment set equal `update.label_ids`.
    ///
    /// New labels are recorded as human assignments by `actor_id`; labels
    /// already assigned keep their original provenance. Every label must be
    /// active and belong to the video's organization.
    pub async fn set_video_labels(
        &self,
        video_id: Uuid,
        update: LabelUpdate,
        actor_id: Uuid,
    ) -> Result<VideoLabels> {
        let video = self.repos.videos.get(video_id).await?;

        let wanted: HashSet<Uuid> = update.label_ids.iter().copied().collect();
        for label_id in &wanted {
            let label = self.repos.labels.get(*label_id).await?;
            if label.organization_id != video.organization_id {
                return Err(Error::LabelNotFound(*label_id));
            }
            if !label.is_active {
                return Err(Error::InvalidInput(format!(
                    "Label {} is inactive",
                    label.name
                )));
            }
        }

        let current = self.repos.assignments.list_for_video(video_id).await?;
        let current_ids: HashSet<Uuid> = current.iter().map(|a| a.label.id).collect();

        let mut removed = 0;
        for label_id in current_ids.difference(&wanted) {
            if self.repos.assignments.remove(video_id, *label_id).await? {
                removed += 1;
            }
        }

        let mut added = 0;
        for label_id in wanted.difference(&current_ids) {
            let inserted = self
                .repos
                .assignments
                .insert_if_absent(NewAssignment {
                    video_id,
                    label_id: *label_id,
                    assigned_by: actor_id,
                    is_ai_suggested: false,
                    ai_confidence: None,
                })
                .await?;
            if inserted {
                added += 1;
            }
        }

        if let Some(keep) = update.keep_permanently {
            if keep != video.keep_permanently {
                self.repos.videos.set_keep_permanently(video_id, keep).await?;
            }
        }

        refresh_expiration(&self.repos, video_id).await?;

        info!(
            subsystem = "jobs",
            component = "assignments",
            op = "set_video_labels",
            %video_id,
            actor_id = %actor_id,
            added,
            removed,
            "Video labels updated"
        );
        self.video_labels(video_id).await
    }
}
