//! Transcript → classification → auto-assignment, for one video or a batch.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use vidcycle_core::{
    defaults, EngineConfig, Error, RagStatus, Repositories, Result, TranscriptSource,
    TranscriptionStatus, Video,
};

use crate::auto_assign::{AssignmentReport, AutoAssigner};
use crate::classifier::{ClassificationContext, ClassificationResult, Classifier};

/// Classification and assignment outcome for one video.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoClassification {
    pub classification: ClassificationResult,
    /// Absent when classification failed and nothing was assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentReport>,
}

/// A video selected for batch classification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchCandidate {
    pub video_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Video> for BatchCandidate {
    fn from(video: &Video) -> Self {
        Self {
            video_id: video.id,
            name: video.name.clone(),
            created_at: video.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchItemStatus {
    Classified,
    Failed,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchItem {
    pub video_id: Uuid,
    pub name: String,
    pub status: BatchItemStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigned: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_eligibility: Option<RagStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of an admin batch run.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BatchReport {
    pub dry_run: bool,
    pub candidates: usize,
    pub classified: usize,
    pub failed: usize,
    /// Candidates not started because the budget ran out.
    pub skipped: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<BatchCandidate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<BatchItem>,
}

/// Clamp a requested batch size into `1..=CLASSIFY_BATCH_MAX_LIMIT`.
pub fn clamp_batch_limit(requested: Option<i64>, default: i64) -> i64 {
    requested
        .unwrap_or(default)
        .clamp(1, defaults::CLASSIFY_BATCH_MAX_LIMIT)
}

#[derive(Clone)]
pub struct ClassificationPipeline {
    repos: Repositories,
    transcripts: Arc<dyn TranscriptSource>,
    classifier: Classifier,
    auto_assigner: AutoAssigner,
    config: EngineConfig,
}

impl ClassificationPipeline {
    pub fn new(
        repos: Repositories,
        transcripts: Arc<dyn TranscriptSource>,
        classifier: Classifier,
        auto_assigner: AutoAssigner,
        config: EngineConfig,
    ) -> Self {
        Self {
            repos,
            transcripts,
            classifier,
            auto_assigner,
            config,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify one video and auto-assign the confident suggestions.
    ///
    /// The video's transcription must be complete. A failed classification
    /// is returned as-is without touching assignments.
    pub async fn classify_video(&self, video_id: Uuid, actor_id: Uuid) -> Result<VideoClassification> {
        let video = self.repos.videos.get(video_id).await?;
        self.classify_loaded(&video, actor_id).await
    }

    async fn classify_loaded(&self, video: &Video, actor_id: Uuid) -> Result<VideoClassification> {
        if video.transcription_status != Some(TranscriptionStatus::Complete) {
            return Err(Error::InvalidInput(format!(
                "Video {} transcription is not complete ({})",
                video.id,
                video
                    .transcription_status
                    .map(|s| s.as_str())
                    .unwrap_or("none")
            )));
        }

        let transcript = self.transcripts.fetch_transcript(video).await?;
        let context = ClassificationContext::from_video(video)
            .with_shared_spaces(self.space_names(video.id).await);
        let classification = self
            .classifier
            .classify(video.id, &transcript, &context, actor_id)
            .await?;

        if !classification.is_success() {
            return Ok(VideoClassification {
                classification,
                assignment: None,
            });
        }

        let assignment = self
            .auto_assigner
            .auto_assign(
                video.id,
                video.organization_id,
                &classification.suggestions,
                actor_id,
            )
            .await?;

        Ok(VideoClassification {
            classification,
            assignment: Some(assignment),
        })
    }

    /// Space names are advisory context; a lookup failure classifies without them.
    async fn space_names(&self, video_id: Uuid) -> Vec<String> {
        match self.repos.videos.list_space_names(video_id).await {
            Ok(names) => names,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "pipeline",
                    %video_id,
                    error = %e,
                    "Space lookup failed, classifying without space context"
                );
                Vec::new()
            }
        }
    }

    /// Classify transcript-complete videos that were never classified, oldest first.
    ///
    /// A dry run only lists candidates: no oracle calls, no writes.
    pub async fn classify_unclassified(
        &self,
        limit: Option<i64>,
        dry_run: bool,
        actor_id: Uuid,
    ) -> Result<BatchReport> {
        let start = Instant::now();
        let limit = clamp_batch_limit(limit, self.config.classify_batch_limit);
        let videos = self.repos.videos.list_unclassified(limit).await?;

        if dry_run {
            return Ok(BatchReport {
                dry_run: true,
                candidates: videos.len(),
                videos: videos.iter().map(BatchCandidate::from).collect(),
                duration_ms: start.elapsed().as_millis() as u64,
                ..Default::default()
            });
        }

        if !self.classifier.is_configured() {
            return Err(Error::Config(
                "No classification oracle configured".to_string(),
            ));
        }

        let deadline = start + self.config.classify_batch_budget;
        let mut report = BatchReport {
            candidates: videos.len(),
            ..Default::default()
        };

        for video in &videos {
            if Instant::now() >= deadline {
                report.skipped = videos.len() - report.results.len();
                warn!(
                    subsystem = "jobs",
                    component = "pipeline",
                    skipped = report.skipped,
                    "Batch budget exhausted"
                );
                break;
            }

            let item = match self.classify_loaded(video, actor_id).await {
                Ok(outcome) => match outcome.classification.failure {
                    None => BatchItem {
                        video_id: video.id,
                        name: video.name.clone(),
                        status: BatchItemStatus::Classified,
                        assigned: outcome.assignment.map(|a| a.assigned).unwrap_or_default(),
                        rag_eligibility: Some(outcome.classification.rag_eligibility),
                        error: None,
                    },
                    Some(failure) => BatchItem {
                        video_id: video.id,
                        name: video.name.clone(),
                        status: BatchItemStatus::Failed,
                        assigned: Vec::new(),
                        rag_eligibility: None,
                        error: Some(failure.message),
                    },
                },
                Err(e) => {
                    warn!(
                        subsystem = "jobs",
                        component = "pipeline",
                        video_id = %video.id,
                        error = %e,
                        "Batch classification failed for video"
                    );
                    BatchItem {
                        video_id: video.id,
                        name: video.name.clone(),
                        status: BatchItemStatus::Failed,
                        assigned: Vec::new(),
                        rag_eligibility: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            match item.status {
                BatchItemStatus::Classified => report.classified += 1,
                BatchItemStatus::Failed => report.failed += 1,
            }
            report.results.push(item);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            subsystem = "jobs",
            component = "pipeline",
            op = "classify_batch",
            candidates = report.candidates,
            classified = report.classified,
            failed = report.failed,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "Batch classification finished"
        );
        Ok(report)
    }
}
