//! Core traits for vidcycle abstractions.
//!
//! These traits define the datastore and external-service seams. Concrete
//! implementations live in `vidcycle-db` (PostgreSQL, in-memory) and
//! `vidcycle-inference` (oracle backends).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::deletion::{DeletionStep, StepOutcome};
use crate::error::Result;
use crate::models::*;

// =============================================================================
// LABEL REPOSITORY
// =============================================================================

/// Repository for label definitions.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// Insert a label. Fails with `DuplicateLabelName` if `(organization_id, name)` exists.
    async fn insert(&self, label: NewLabel) -> Result<Label>;

    /// Insert a label unless `(organization_id, name)` already exists.
    ///
    /// Returns `true` if a row was inserted. A single statement, so there is
    /// no window between the existence check and the write.
    async fn insert_if_absent(&self, label: NewLabel) -> Result<bool>;

    /// Fetch a label by ID.
    async fn get(&self, id: Uuid) -> Result<Label>;

    /// Active labels of an organization ordered by (category, display_name).
    async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Label>>;

    /// Resolve an active label by machine name.
    async fn find_active_by_name(&self, organization_id: Uuid, name: &str)
        -> Result<Option<Label>>;

    /// Whether the organization has at least one active system label.
    async fn has_active_system_labels(&self, organization_id: Uuid) -> Result<bool>;

    /// Whether a system label with this exact name exists in any organization.
    async fn system_label_exists(&self, name: &str) -> Result<bool>;

    /// Distinct names of all system labels across organizations.
    async fn list_system_label_names(&self) -> Result<Vec<String>>;

    /// Organizations that have ever had system labels seeded.
    async fn organizations_with_system_labels(&self) -> Result<Vec<Uuid>>;

    /// Activate or soft-delete a label.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<()>;
}

// =============================================================================
// ASSIGNMENT REPOSITORY
// =============================================================================

/// Repository for video ↔ label assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Assignments of a video with their label definitions.
    async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<AssignedLabel>>;

    /// Insert unless `(video_id, label_id)` is already assigned.
    ///
    /// Returns `true` if a row was inserted; existing provenance is never overwritten.
    async fn insert_if_absent(&self, assignment: NewAssignment) -> Result<bool>;

    /// Remove an assignment. Returns `true` if it existed.
    async fn remove(&self, video_id: Uuid, label_id: Uuid) -> Result<bool>;
}

// =============================================================================
// VIDEO REPOSITORY
// =============================================================================

/// Repository for the lifecycle fields of videos.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Fetch a video. Fails with `VideoNotFound`.
    async fn get(&self, id: Uuid) -> Result<Video>;

    /// Persist suggestions, classification time, and RAG status in one write.
    async fn save_classification(&self, video_id: Uuid, write: ClassificationWrite) -> Result<()>;

    /// Persist a recomputed expiration.
    async fn set_expiration(&self, video_id: Uuid, expires_at: Option<DateTime<Utc>>)
        -> Result<()>;

    /// Set the keep-permanently override.
    async fn set_keep_permanently(&self, video_id: Uuid, keep: bool) -> Result<()>;

    /// Advance the transcription state machine. Invalid transitions fail with `InvalidInput`.
    async fn set_transcription_status(
        &self,
        video_id: Uuid,
        status: TranscriptionStatus,
    ) -> Result<()>;

    /// Clear the transcription status after a hard failure so it can be retried.
    async fn mark_transcription_failed(&self, video_id: Uuid) -> Result<()>;

    /// Names of the spaces the video is shared into, sorted and deduplicated.
    async fn list_space_names(&self, video_id: Uuid) -> Result<Vec<String>>;

    /// Transcript-complete videos never classified, oldest first.
    async fn list_unclassified(&self, limit: i64) -> Result<Vec<Video>>;

    /// Videos with `expires_at <= now` and `keep_permanently = false`.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ExpiredVideo>>;
}

// =============================================================================
// CLEANUP REPOSITORY
// =============================================================================

/// Permanent deletion of a video's rows.
#[async_trait]
pub trait CleanupRepository: Send + Sync {
    /// Run `steps` in order inside one transaction, but only while the video
    /// is still eligible at `now` (`expires_at <= now`, not kept).
    ///
    /// The eligibility check and the deletes are atomic with respect to
    /// concurrent writes to the video row. Returns `None`, deleting nothing,
    /// when the video is gone or no longer eligible.
    async fn delete_video_rows(
        &self,
        video_id: Uuid,
        now: DateTime<Utc>,
        steps: &[DeletionStep],
    ) -> Result<Option<Vec<StepOutcome>>>;
}

// =============================================================================
// EXTERNAL SERVICES
// =============================================================================

/// Text-completion oracle.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Object storage holding a video's media, thumbnails, and captions.
///
/// Keys are `/`-separated paths; a video's assets live under
/// `{owner_id}/{video_id}/`.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// All keys starting with `prefix`. An empty prefix listing is not an error.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read one object. Fails with `NotFound` if absent.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the given keys, returning how many were removed.
    async fn delete_many(&self, keys: &[String]) -> Result<usize>;
}

/// Source of plain-text transcripts.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Caption-stripped transcript text of a video. Fails with `NotFound` if absent.
    async fn fetch_transcript(&self, video: &Video) -> Result<String>;
}

// =============================================================================
// BUNDLE
// =============================================================================

/// Every repository the engine needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub labels: Arc<dyn LabelRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub videos: Arc<dyn VideoRepository>,
    pub cleanup: Arc<dyn CleanupRepository>,
}
