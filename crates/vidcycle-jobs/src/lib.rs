//! # vidcycle-jobs
//!
//! Label and retention lifecycle services for vidcycle.
//!
//! This crate provides:
//! - The label catalog (system seeding, custom labels, deactivation)
//! - User assignment updates with retention refresh
//! - Transcript classification and threshold-gated auto-assignment
//! - Promotion of custom labels into the system vocabulary
//! - The expired-video cleanup job
//!
//! ## Example
//!
//! ```ignore
//! use vidcycle_jobs::LifecycleEngine;
//!
//! let engine = LifecycleEngine::builder(db.repositories(), assets, transcripts)
//!     .with_oracle(oracle)
//!     .with_config(EngineConfig::from_env())
//!     .build();
//!
//! let outcome = engine.pipeline.classify_video(video_id, actor_id).await?;
//! let report = engine.cleanup.run(Utc::now()).await?;
//! ```

pub mod assignments;
pub mod auto_assign;
pub mod catalog;
pub mod classifier;
pub mod cleanup;
pub mod pipeline;
pub mod promotion;

use std::sync::Arc;

// Re-export core types
pub use vidcycle_core::*;

pub use assignments::{refresh_expiration, AssignmentService, LabelUpdate, VideoLabels};
pub use auto_assign::{AssignmentReport, AutoAssigner, SkipReason, SkippedSuggestion};
pub use catalog::{LabelCatalog, SeedOutcome};
pub use classifier::{
    ClassificationContext, ClassificationFailure, ClassificationResult, Classifier, FailureKind,
};
pub use cleanup::{CleanupDetail, CleanupJob, CleanupReport, CleanupStatus};
pub use pipeline::{
    BatchCandidate, BatchItem, BatchItemStatus, BatchReport, ClassificationPipeline,
    VideoClassification,
};
pub use promotion::{
    EvaluationResult, PromotionCandidate, PromotionEvaluator, PromotionOutcome, PropagationReport,
};

/// Every lifecycle service, wired over one set of repositories.
#[derive(Clone)]
pub struct LifecycleEngine {
    pub catalog: LabelCatalog,
    pub assignments: AssignmentService,
    pub pipeline: ClassificationPipeline,
    pub promotion: PromotionEvaluator,
    pub cleanup: CleanupJob,
    pub config: EngineConfig,
}

impl LifecycleEngine {
    pub fn builder(
        repos: Repositories,
        assets: Arc<dyn AssetStore>,
        transcripts: Arc<dyn TranscriptSource>,
    ) -> LifecycleEngineBuilder {
        LifecycleEngineBuilder {
            repos,
            assets,
            transcripts,
            oracle: None,
            vocabulary: Arc::new(LabelVocabulary::default()),
            config: EngineConfig::default(),
        }
    }

    /// True when classification and promotion can reach an oracle.
    pub fn has_oracle(&self) -> bool {
        self.pipeline.classifier().is_configured()
    }
}

/// Builder for [`LifecycleEngine`].
pub struct LifecycleEngineBuilder {
    repos: Repositories,
    assets: Arc<dyn AssetStore>,
    transcripts: Arc<dyn TranscriptSource>,
    oracle: Option<Arc<dyn GenerationBackend>>,
    vocabulary: Arc<LabelVocabulary>,
    config: EngineConfig,
}

impl LifecycleEngineBuilder {
    pub fn with_oracle(mut self, oracle: Arc<dyn GenerationBackend>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_optional_oracle(mut self, oracle: Option<Arc<dyn GenerationBackend>>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: LabelVocabulary) -> Self {
        self.vocabulary = Arc::new(vocabulary);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> LifecycleEngine {
        let repos = self.repos;
        let classifier = Classifier::new(
            self.oracle.clone(),
            repos.videos.clone(),
            self.vocabulary.clone(),
            self.config.clone(),
        );
        let auto_assigner = AutoAssigner::new(repos.clone(), self.config.confidence_threshold);

        LifecycleEngine {
            catalog: LabelCatalog::new(repos.labels.clone(), self.vocabulary),
            assignments: AssignmentService::new(repos.clone()),
            promotion: PromotionEvaluator::new(self.oracle, repos.labels.clone()),
            cleanup: CleanupJob::new(
                repos.videos.clone(),
                repos.cleanup.clone(),
                self.assets,
                &self.config,
            ),
            pipeline: ClassificationPipeline::new(
                repos,
                self.transcripts,
                classifier,
                auto_assigner,
                self.config.clone(),
            ),
            config: self.config,
        }
    }
}
