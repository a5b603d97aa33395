//! Retention calculator.
//!
//! `expires_at` is a pure function of `keep_permanently`, the retention days
//! of the currently assigned labels, and the video's `created_at`. Every write
//! path that changes assignments or the keep flag recomputes it through
//! [`compute_expiration`] and persists the result.
//!
//! Retention is measured from video creation, not from the moment the
//! retention-bearing label was assigned: assigning a short-retention label to
//! an old video can make it immediately eligible for cleanup.

use chrono::{DateTime, Days, Utc};

use crate::models::{AssignedLabel, Label, Video};

/// Compute the expiration instant, or `None` for "never expires".
///
/// 1. `keep_permanently` wins over everything.
/// 2. Labels without retention (`None`) are ignored.
/// 3. No retention-bearing labels ⇒ `None`.
/// 4. Otherwise `created_at + min(retention_days)` in calendar days.
pub fn compute_expiration<I>(
    created_at: DateTime<Utc>,
    keep_permanently: bool,
    retention_days: I,
) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = Option<i32>>,
{
    if keep_permanently {
        return None;
    }

    let shortest = retention_days
        .into_iter()
        .flatten()
        .filter_map(|d| u64::try_from(d).ok())
        .min()?;

    created_at.checked_add_days(Days::new(shortest))
}

/// [`compute_expiration`] over a video and its assigned label definitions.
pub fn expiration_for_labels(video: &Video, labels: &[Label]) -> Option<DateTime<Utc>> {
    compute_expiration(
        video.created_at,
        video.keep_permanently,
        labels.iter().map(|l| l.retention_days),
    )
}

/// [`compute_expiration`] over a video and its assignments.
pub fn expiration_for_assignments(
    video: &Video,
    assigned: &[AssignedLabel],
) -> Option<DateTime<Utc>> {
    compute_expiration(
        video.created_at,
        video.keep_permanently,
        assigned.iter().map(|a| a.label.retention_days),
    )
}
