//! Centralized default constants for vidcycle.
//!
//! Every tunable in [`crate::config::EngineConfig`] starts from a value here.

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Minimum suggestion confidence for automatic assignment (inclusive).
pub const CONFIDENCE_THRESHOLD: f64 = 0.75;

/// Multiplier applied to the primary confidence for the secondary content-type label.
pub const SECONDARY_CONFIDENCE_DISCOUNT: f64 = 0.7;

/// Transcript prefix length (characters) sent to the oracle.
pub const TRANSCRIPT_MAX_CHARS: usize = 8000;

/// Default number of videos considered by one admin batch run.
pub const CLASSIFY_BATCH_LIMIT: i64 = 50;

/// Upper bound accepted for the admin batch `limit` parameter.
pub const CLASSIFY_BATCH_MAX_LIMIT: i64 = 500;

/// Wall-clock budget for one admin batch run (seconds).
pub const CLASSIFY_BATCH_BUDGET_SECS: u64 = 270;

// =============================================================================
// CLEANUP
// =============================================================================

/// Wall-clock budget for one cleanup run (seconds).
///
/// Slightly under five minutes so a run triggered by a serverless cron
/// finishes before the platform's own timeout.
pub const CLEANUP_BUDGET_SECS: u64 = 270;

/// Videos processed concurrently by one cleanup run.
pub const CLEANUP_CONCURRENCY: usize = 4;

// =============================================================================
// LABELS
// =============================================================================

/// Color given to custom labels created without one.
pub const LABEL_COLOR: &str = "#6B7280";

/// Maximum length of a label machine name.
pub const LABEL_NAME_MAX_LEN: usize = 64;

/// Maximum length of a label display name.
pub const LABEL_DISPLAY_NAME_MAX_LEN: usize = 100;

// =============================================================================
// STORAGE
// =============================================================================

/// File name of the WebVTT transcript inside a video's storage prefix.
pub const TRANSCRIPT_FILE: &str = "transcription.vtt";
