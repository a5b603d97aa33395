//! Scheduled deletion of expired videos.
//!
//! Each video is handled independently: assets first (best effort), then the
//! ordered row deletion. Selection happens once per run, so eligibility is
//! checked again before assets are touched and once more, under a row lock,
//! when the rows are deleted. A video kept or extended in the meantime is
//! left alone. The batch stops starting new videos once the wall-clock budget
//! is spent; videos already in flight run to completion.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use vidcycle_core::{
    AssetStore, CleanupRepository, EngineConfig, Error, ExpiredVideo, Result, StepOutcome,
    VideoRepository, DELETION_PIPELINE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    Deleted,
    Error,
    /// Kept, extended or already removed after selection.
    NotEligible,
}

/// Outcome for one expired video.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CleanupDetail {
    pub video_id: Uuid,
    pub name: String,
    pub expires_at: DateTime<Utc>,
    pub status: CleanupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub assets_removed: usize,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<StepOutcome>,
}

impl CleanupDetail {
    fn new(video: ExpiredVideo, status: CleanupStatus) -> Self {
        Self {
            video_id: video.id,
            name: video.name,
            expires_at: video.expires_at,
            status,
            error: None,
            assets_removed: 0,
            rows: Vec::new(),
        }
    }

    fn with_error(mut self, error: Error) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CleanupReport {
    pub deleted: usize,
    pub errors: usize,
    pub not_eligible: usize,
    /// Candidates not started because the budget ran out.
    pub skipped: usize,
    pub duration_ms: u64,
    pub details: Vec<CleanupDetail>,
}

/// Deletes every video whose expiration has passed.
#[derive(Clone)]
pub struct CleanupJob {
    videos: Arc<dyn VideoRepository>,
    cleanup: Arc<dyn CleanupRepository>,
    assets: Arc<dyn AssetStore>,
    budget: Duration,
    concurrency: usize,
}

impl CleanupJob {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        cleanup: Arc<dyn CleanupRepository>,
        assets: Arc<dyn AssetStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            videos,
            cleanup,
            assets,
            budget: config.cleanup_budget,
            concurrency: config.cleanup_concurrency.max(1),
        }
    }

    /// Run one cleanup pass. Only selection errors abort the run.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CleanupReport> {
        let start = Instant::now();
        let deadline = start + self.budget;
        let candidates = self.videos.list_expired(now).await?;
        let total = candidates.len();

        info!(
            subsystem = "jobs",
            component = "cleanup",
            candidates = total,
            "Starting expired video cleanup"
        );

        let details: Vec<CleanupDetail> = stream::iter(candidates)
            .map(|video| async move {
                if Instant::now() >= deadline {
                    return None;
                }
                Some(self.delete_video(video, now).await)
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|detail| async move { detail })
            .collect()
            .await;

        let count = |status: CleanupStatus| {
            details.iter().filter(|d| d.status == status).count()
        };
        let report = CleanupReport {
            deleted: count(CleanupStatus::Deleted),
            errors: count(CleanupStatus::Error),
            not_eligible: count(CleanupStatus::NotEligible),
            skipped: total - details.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            details,
        };

        if report.skipped > 0 {
            warn!(
                subsystem = "jobs",
                component = "cleanup",
                skipped = report.skipped,
                budget_secs = self.budget.as_secs(),
                "Cleanup budget exhausted, remaining videos left for next run"
            );
        }
        info!(
            subsystem = "jobs",
            component = "cleanup",
            deleted = report.deleted,
            errors = report.errors,
            not_eligible = report.not_eligible,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "Cleanup finished"
        );
        Ok(report)
    }

    async fn delete_video(&self, video: ExpiredVideo, now: DateTime<Utc>) -> CleanupDetail {
        let keys = self.list_assets(video.id, &video.storage_prefix()).await;

        match self.videos.get(video.id).await {
            Ok(current) if current.is_cleanup_eligible(now) => {}
            Ok(_) | Err(Error::VideoNotFound(_)) => {
                info!(
                    subsystem = "jobs",
                    component = "cleanup",
                    video_id = %video.id,
                    "Video no longer eligible, left in place"
                );
                return CleanupDetail::new(video, CleanupStatus::NotEligible);
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "cleanup",
                    video_id = %video.id,
                    error = %e,
                    "Eligibility check failed"
                );
                return CleanupDetail::new(video, CleanupStatus::Error).with_error(e);
            }
        }

        let assets_removed = self.delete_assets(video.id, &keys).await;

        let mut detail = match self
            .cleanup
            .delete_video_rows(video.id, now, &DELETION_PIPELINE)
            .await
        {
            Ok(Some(rows)) => {
                debug!(
                    subsystem = "jobs",
                    component = "cleanup",
                    video_id = %video.id,
                    assets_removed,
                    "Video deleted"
                );
                let mut detail = CleanupDetail::new(video, CleanupStatus::Deleted);
                detail.rows = rows;
                detail
            }
            Ok(None) => {
                warn!(
                    subsystem = "jobs",
                    component = "cleanup",
                    video_id = %video.id,
                    assets_removed,
                    "Video changed during deletion, rows left in place"
                );
                CleanupDetail::new(video, CleanupStatus::NotEligible)
            }
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "cleanup",
                    video_id = %video.id,
                    error = %e,
                    "Video row deletion failed"
                );
                CleanupDetail::new(video, CleanupStatus::Error).with_error(e)
            }
        };
        detail.assets_removed = assets_removed;
        detail
    }

    /// Storage failures are logged and treated as no assets.
    async fn list_assets(&self, video_id: Uuid, prefix: &str) -> Vec<String> {
        match self.assets.list(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "cleanup",
                    %video_id,
                    error = %e,
                    "Asset listing failed"
                );
                Vec::new()
            }
        }
    }

    /// Best effort: storage failures are logged and reported as zero removed.
    async fn delete_assets(&self, video_id: Uuid, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }
        match self.assets.delete_many(keys).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "cleanup",
                    %video_id,
                    keys = keys.len(),
                    error = %e,
                    "Asset deletion failed"
                );
                0
            }
        }
    }
}
