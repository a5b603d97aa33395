//! Core data models for labels, assignments, and videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
// ENUMS
// =============================================================================

/// Which vocabulary list a label belongs to.
///
/// Declaration order is the listing order (`content_type` before `department`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
    #[default]
    ContentType,
    Department,
}

impl LabelCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentType => "content_type",
            Self::Department => "department",
        }
    }
}

impl std::fmt::Display for LabelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LabelCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "content_type" | "contenttype" => Ok(Self::ContentType),
            "department" => Ok(Self::Department),
            _ => Err(format!("Invalid label category: {}", s)),
        }
    }
}

/// Knowledge-base (RAG) eligibility of a video, or the default hint of a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RagStatus {
    Eligible,
    Excluded,
    #[default]
    Pending,
}

impl RagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::Excluded => "excluded",
            Self::Pending => "pending",
        }
    }

    /// Lenient parse used on oracle output: anything unrecognised is `Pending`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for RagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RagStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eligible" => Ok(Self::Eligible),
            "excluded" => Ok(Self::Excluded),
            "pending" => Ok(Self::Pending),
            _ => Err(format!("Invalid RAG status: {}", s)),
        }
    }
}

/// Transcription pipeline state of a video.
///
/// `Pending → Processing → {Complete | Skipped | NoAudio}`. A hard failure
/// clears the status (stored as NULL) so the video becomes retry-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStatus {
    Pending,
    Processing,
    Complete,
    Skipped,
    NoAudio,
}

impl TranscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Skipped => "skipped",
            Self::NoAudio => "no_audio",
        }
    }

    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Skipped | Self::NoAudio)
    }

    /// Whether `self → next` is a legal forward transition.
    ///
    /// `None` as the current state means "unset" (never started or reset
    /// after a failure); it may only move to `Pending` or `Processing`.
    pub fn can_transition(from: Option<Self>, next: Self) -> bool {
        match (from, next) {
            (None, Self::Pending | Self::Processing) => true,
            (Some(Self::Pending), Self::Processing) => true,
            (Some(Self::Processing), Self::Complete | Self::Skipped | Self::NoAudio) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TranscriptionStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "complete" => Ok(Self::Complete),
            "skipped" => Ok(Self::Skipped),
            "no_audio" => Ok(Self::NoAudio),
            _ => Err(format!("Invalid transcription status: {}", s)),
        }
    }
}

// =============================================================================
// LABELS
// =============================================================================

/// A classification tag scoped to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Label {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Machine key, uppercase snake-case, unique per organization.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub category: LabelCategory,
    /// Days after video creation before expiry; `None` never expires.
    pub retention_days: Option<i32>,
    pub rag_default: RagStatus,
    pub is_system: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a label row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLabel {
    pub organization_id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: Option<String>,
    pub category: LabelCategory,
    pub retention_days: Option<i32>,
    pub rag_default: RagStatus,
    pub is_system: bool,
}

/// Organization-independent label definition (vocabulary entry or promoted label).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabelTemplate {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub category: LabelCategory,
    #[serde(default)]
    pub retention_days: Option<i32>,
    #[serde(default)]
    pub rag_default: RagStatus,
}

impl LabelTemplate {
    /// Materialize this template as a system label row for `organization_id`.
    pub fn to_system_label(&self, organization_id: Uuid) -> NewLabel {
        NewLabel {
            organization_id,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            category: self.category,
            retention_days: self.retention_days,
            rag_default: self.rag_default,
            is_system: true,
        }
    }
}

/// User request to create a custom label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateLabelRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub category: Option<LabelCategory>,
    #[serde(default)]
    pub retention_days: Option<i32>,
}

// =============================================================================
// ASSIGNMENTS
// =============================================================================

/// Fields for inserting an assignment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssignment {
    pub video_id: Uuid,
    pub label_id: Uuid,
    pub assigned_by: Uuid,
    pub is_ai_suggested: bool,
    pub ai_confidence: Option<f64>,
}

/// A label applied to a video, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssignedLabel {
    pub label: Label,
    pub assigned_by: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub is_ai_suggested: bool,
    pub ai_confidence: Option<f64>,
}

// =============================================================================
// VIDEOS
// =============================================================================

/// One label-name/confidence pair produced by classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LabelSuggestion {
    pub name: String,
    pub confidence: f64,
}

impl LabelSuggestion {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// Lifecycle-relevant fields of a recorded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Video {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub duration_seconds: Option<f64>,
    pub ai_summary: Option<String>,
    pub transcription_status: Option<TranscriptionStatus>,
    pub rag_status: RagStatus,
    pub rag_status_updated_at: Option<DateTime<Utc>>,
    pub rag_status_updated_by: Option<Uuid>,
    pub keep_permanently: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub ai_suggested_labels: Option<Vec<LabelSuggestion>>,
    pub ai_classified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Video {
    /// Object-store prefix holding every binary asset of this video.
    pub fn storage_prefix(&self) -> String {
        storage_prefix(self.owner_id, self.id)
    }

    /// Whether cleanup may delete this video at `now`.
    ///
    /// Same condition as the expired scan: `expires_at <= now` and not kept.
    pub fn is_cleanup_eligible(&self, now: DateTime<Utc>) -> bool {
        !self.keep_permanently && self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Object-store prefix for a video: `{owner_id}/{video_id}/`.
pub fn storage_prefix(owner_id: Uuid, video_id: Uuid) -> String {
    format!("{}/{}/", owner_id, video_id)
}

/// Write-back of a successful classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationWrite {
    pub suggestions: Vec<LabelSuggestion>,
    pub rag_status: RagStatus,
    pub classified_at: DateTime<Utc>,
    pub actor_id: Uuid,
}

/// A video selected by the cleanup scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiredVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

impl ExpiredVideo {
    pub fn storage_prefix(&self) -> String {
        storage_prefix(self.owner_id, self.id)
    }
}
