//! Ordered deletion pipeline for permanently removing a video.
//!
//! Dependent rows go first so foreign keys never block the final delete of
//! the video row. The order lives here as data so it can be reviewed and
//! tested on its own.

use serde::{Deserialize, Serialize};

/// One table cleared when a video is permanently deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStep {
    Comments,
    LabelAssignments,
    SpaceShares,
    DirectShares,
    Video,
}

/// Deletion order: comments → label assignments → space/folder shares → direct shares → video.
pub const DELETION_PIPELINE: [DeletionStep; 5] = [
    DeletionStep::Comments,
    DeletionStep::LabelAssignments,
    DeletionStep::SpaceShares,
    DeletionStep::DirectShares,
    DeletionStep::Video,
];

impl DeletionStep {
    /// Table cleared by this step.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Comments => "comment",
            Self::LabelAssignments => "video_label",
            Self::SpaceShares => "space_video",
            Self::DirectShares => "shared_video",
            Self::Video => "video",
        }
    }

    /// Column matched against the video id.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Video => "id",
            _ => "video_id",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::LabelAssignments => "label_assignments",
            Self::SpaceShares => "space_shares",
            Self::DirectShares => "direct_shares",
            Self::Video => "video",
        }
    }
}

/// Rows removed by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: DeletionStep,
    pub rows: u64,
}
