//! Engine configuration.
//!
//! Thresholds, budgets, and the admin allowlist are injected rather than
//! hardcoded so each deployment (and each test) can set its own.

use std::time::Duration;

use uuid::Uuid;

use crate::defaults;

/// Tunables for classification, assignment, and cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum confidence (inclusive) for automatic assignment.
    pub confidence_threshold: f64,
    /// Multiplier applied to the secondary content-type suggestion.
    pub secondary_discount: f64,
    /// Transcript prefix length (characters) sent to the oracle.
    pub transcript_max_chars: usize,
    /// Wall-clock budget for one cleanup run.
    pub cleanup_budget: Duration,
    /// Videos processed concurrently during cleanup.
    pub cleanup_concurrency: usize,
    /// Wall-clock budget for one admin classification batch.
    pub classify_batch_budget: Duration,
    /// Default `limit` of an admin classification batch.
    pub classify_batch_limit: i64,
    /// Users allowed to call admin endpoints.
    pub admin_user_ids: Vec<Uuid>,
    /// Actor recorded on writes made by the engine itself.
    pub system_actor_id: Uuid,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            secondary_discount: defaults::SECONDARY_CONFIDENCE_DISCOUNT,
            transcript_max_chars: defaults::TRANSCRIPT_MAX_CHARS,
            cleanup_budget: Duration::from_secs(defaults::CLEANUP_BUDGET_SECS),
            cleanup_concurrency: defaults::CLEANUP_CONCURRENCY,
            classify_batch_budget: Duration::from_secs(defaults::CLASSIFY_BATCH_BUDGET_SECS),
            classify_batch_limit: defaults::CLASSIFY_BATCH_LIMIT,
            admin_user_ids: Vec::new(),
            system_actor_id: Uuid::nil(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl EngineConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CLASSIFY_CONFIDENCE_THRESHOLD` | `0.75` | Auto-assignment cutoff |
    /// | `CLASSIFY_SECONDARY_DISCOUNT` | `0.7` | Secondary label multiplier |
    /// | `CLASSIFY_TRANSCRIPT_MAX_CHARS` | `8000` | Transcript prefix sent to the oracle |
    /// | `CLEANUP_BUDGET_SECS` | `270` | Cleanup wall-clock budget |
    /// | `CLEANUP_CONCURRENCY` | `4` | Videos deleted in parallel |
    /// | `CLASSIFY_BATCH_BUDGET_SECS` | `270` | Admin batch wall-clock budget |
    /// | `CLASSIFY_BATCH_DEFAULT_LIMIT` | `50` | Admin batch default size |
    /// | `ADMIN_USER_IDS` | (empty) | Comma-separated admin UUIDs |
    /// | `SYSTEM_ACTOR_ID` | nil UUID | Actor for engine writes |
    pub fn from_env() -> Self {
        let base = Self::default();

        let admin_user_ids = std::env::var("ADMIN_USER_IDS")
            .map(|v| parse_uuid_list(&v))
            .unwrap_or_default();

        Self {
            confidence_threshold: env_parse::<f64>("CLASSIFY_CONFIDENCE_THRESHOLD")
                .map(|t| t.clamp(0.0, 1.0))
                .unwrap_or(base.confidence_threshold),
            secondary_discount: env_parse::<f64>("CLASSIFY_SECONDARY_DISCOUNT")
                .map(|d| d.clamp(0.0, 1.0))
                .unwrap_or(base.secondary_discount),
            transcript_max_chars: env_parse("CLASSIFY_TRANSCRIPT_MAX_CHARS")
                .unwrap_or(base.transcript_max_chars),
            cleanup_budget: env_parse("CLEANUP_BUDGET_SECS")
                .map(Duration::from_secs)
                .unwrap_or(base.cleanup_budget),
            cleanup_concurrency: env_parse::<usize>("CLEANUP_CONCURRENCY")
                .unwrap_or(base.cleanup_concurrency)
                .max(1),
            classify_batch_budget: env_parse("CLASSIFY_BATCH_BUDGET_SECS")
                .map(Duration::from_secs)
                .unwrap_or(base.classify_batch_budget),
            classify_batch_limit: env_parse::<i64>("CLASSIFY_BATCH_DEFAULT_LIMIT")
                .unwrap_or(base.classify_batch_limit)
                .clamp(1, defaults::CLASSIFY_BATCH_MAX_LIMIT),
            admin_user_ids,
            system_actor_id: env_parse("SYSTEM_ACTOR_ID").unwrap_or(base.system_actor_id),
        }
    }

    /// Set the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Set the cleanup budget.
    pub fn with_cleanup_budget(mut self, budget: Duration) -> Self {
        self.cleanup_budget = budget;
        self
    }

    /// Set the admin allowlist.
    pub fn with_admins(mut self, admins: Vec<Uuid>) -> Self {
        self.admin_user_ids = admins;
        self
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

fn parse_uuid_list(raw: &str) -> Vec<Uuid> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<Uuid>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Ignoring invalid admin user id '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}
