//! Threshold-gated assignment of classifier suggestions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use vidcycle_core::{LabelSuggestion, NewAssignment, Repositories, Result};

use crate::assignments::refresh_expiration;

/// Why a suggestion was not assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    BelowThreshold,
    UnknownLabel,
    AlreadyAssigned,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SkippedSuggestion {
    pub name: String,
    pub confidence: f64,
    pub reason: SkipReason,
}

/// What auto-assignment did for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AssignmentReport {
    pub assigned: Vec<String>,
    pub skipped: Vec<SkippedSuggestion>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Assigns suggestions whose confidence reaches the threshold.
#[derive(Clone)]
pub struct AutoAssigner {
    repos: Repositories,
    threshold: f64,
}

impl AutoAssigner {
    pub fn new(repos: Repositories, threshold: f64) -> Self {
        Self { repos, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Assign qualifying suggestions, then refresh the video's expiration.
    ///
    /// The threshold is inclusive. Names are resolved against the
    /// organization's active labels; existing assignments are left untouched,
    /// so running twice adds nothing.
    pub async fn auto_assign(
        &self,
        video_id: Uuid,
        organization_id: Uuid,
        suggestions: &[LabelSuggestion],
        actor_id: Uuid,
    ) -> Result<AssignmentReport> {
        let mut report = AssignmentReport::default();

        for suggestion in suggestions {
            let skip = |reason| SkippedSuggestion {
                name: suggestion.name.clone(),
                confidence: suggestion.confidence,
                reason,
            };

            if suggestion.confidence < self.threshold {
                report.skipped.push(skip(SkipReason::BelowThreshold));
                continue;
            }

            let label = match self
                .repos
                .labels
                .find_active_by_name(organization_id, &suggestion.name)
                .await?
            {
                Some(label) => label,
                None => {
                    debug!(
                        subsystem = "jobs",
                        component = "auto_assign",
                        %video_id,
                        label = %suggestion.name,
                        "Suggested label not active in organization"
                    );
                    report.skipped.push(skip(SkipReason::UnknownLabel));
                    continue;
                }
            };

            let inserted = self
                .repos
                .assignments
                .insert_if_absent(NewAssignment {
                    video_id,
                    label_id: label.id,
                    assigned_by: actor_id,
                    is_ai_suggested: true,
                    ai_confidence: Some(suggestion.confidence),
                })
                .await?;

            if inserted {
                report.assigned.push(label.name);
            } else {
                report.skipped.push(skip(SkipReason::AlreadyAssigned));
            }
        }

        report.expires_at = refresh_expiration(&self.repos, video_id).await?;

        info!(
            subsystem = "jobs",
            component = "auto_assign",
            %video_id,
            assigned = report.assigned.len(),
            skipped = report.skipped.len(),
            threshold = self.threshold,
            "Auto-assignment finished"
        );
        Ok(report)
    }
}
