//! Promotion of user-created labels into the shared system vocabulary.
//!
//! Runs in the background after a custom label is created. Nothing here is
//! allowed to fail label creation: evaluation problems become a negative
//! verdict, and propagation failures are logged per organization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use vidcycle_core::{
    normalize_label_name, validate_label_name, Error, GenerationBackend, Label, LabelCategory,
    LabelRepository, LabelTemplate, RagStatus, Result,
};
use vidcycle_inference::parse_json_reply;

/// A user label offered for promotion.
#[derive(Debug, Clone)]
pub struct PromotionCandidate {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: LabelCategory,
}

impl From<&Label> for PromotionCandidate {
    fn from(label: &Label) -> Self {
        Self {
            name: label.name.clone(),
            display_name: label.display_name.clone(),
            description: label.description.clone(),
            category: label.category,
        }
    }
}

/// The oracle's verdict on a candidate, normalized.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EvaluationResult {
    pub should_promote: bool,
    pub reason: String,
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub duplicate_of: Option<String>,
    pub suggested_category: Option<LabelCategory>,
}

impl EvaluationResult {
    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            should_promote: false,
            reason: reason.into(),
            name: None,
            display_name: None,
            description: None,
            duplicate_of: None,
            suggested_category: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PromotionOutcome {
    pub promoted: bool,
    pub reason: String,
    pub organizations_added: usize,
    pub organizations_failed: usize,
}

impl PromotionOutcome {
    fn declined(reason: impl Into<String>) -> Self {
        Self {
            promoted: false,
            reason: reason.into(),
            organizations_added: 0,
            organizations_failed: 0,
        }
    }
}

/// Result of fanning a system label out to every seeded organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PropagationReport {
    pub inserted: usize,
    pub already_present: usize,
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct OracleEvaluation {
    #[serde(default)]
    should_promote: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duplicate_of: Option<String>,
    #[serde(default)]
    suggested_category: Option<String>,
}

const SYSTEM_PROMPT: &str = r#"You curate a shared vocabulary of video labels used by many organizations.

Decide whether a label created by one organization should become a system label for everyone. Judge:
- relevance: does it describe the kind of content or the owning department of a workplace video?
- uniqueness: is it clearly different from every existing system label? Near-synonyms are duplicates.
- generality: would most organizations use it, or is it specific to one company, product, or team?
- clarity: is the meaning obvious from the name?

Respond with ONLY a JSON object:
{"should_promote": true|false, "reason": "one sentence", "name": "UPPER_SNAKE_CASE English name", "display_name": "Title Case", "description": "short description", "duplicate_of": "EXISTING_NAME or null", "suggested_category": "content_type|department"}"#;

fn build_prompt(candidate: &PromotionCandidate, existing: &[String]) -> String {
    format!(
        "Existing system labels: {}\n\nCandidate:\nname: {}\ndisplay_name: {}\ndescription: {}\ncategory: {}",
        existing.join(", "),
        candidate.name,
        candidate.display_name,
        candidate.description.as_deref().unwrap_or("(none)"),
        candidate.category,
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}

/// Evaluates, promotes, and propagates system labels.
#[derive(Clone)]
pub struct PromotionEvaluator {
    oracle: Option<Arc<dyn GenerationBackend>>,
    labels: Arc<dyn LabelRepository>,
}

impl PromotionEvaluator {
    pub fn new(
        oracle: Option<Arc<dyn GenerationBackend>>,
        labels: Arc<dyn LabelRepository>,
    ) -> Self {
        Self { oracle, labels }
    }

    /// Ask the oracle whether `candidate` belongs in the system vocabulary.
    ///
    /// Never fails: missing configuration, oracle errors and unusable replies
    /// all come back as `should_promote = false` with the cause as reason.
    pub async fn evaluate(&self, candidate: &PromotionCandidate) -> EvaluationResult {
        let Some(oracle) = self.oracle.as_ref() else {
            return EvaluationResult::rejected("No classification oracle configured");
        };

        let existing = match self.labels.list_system_label_names().await {
            Ok(names) => names,
            Err(e) => return EvaluationResult::rejected(format!("Could not load system labels: {}", e)),
        };

        let reply = match oracle
            .generate_with_system(SYSTEM_PROMPT, &build_prompt(candidate, &existing))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "promotion",
                    label = %candidate.name,
                    error = %e,
                    "Promotion evaluation failed"
                );
                return EvaluationResult::rejected(format!("Evaluation failed: {}", e));
            }
        };

        let parsed: OracleEvaluation = match parse_json_reply(&reply) {
            Ok(parsed) => parsed,
            Err(e) => return EvaluationResult::rejected(format!("Unusable evaluation: {}", e)),
        };

        let name = non_empty(parsed.name)
            .map(|n| normalize_label_name(&n))
            .or_else(|| Some(candidate.name.clone()))
            .filter(|n| validate_label_name(n).is_ok());
        let suggested_category = parsed
            .suggested_category
            .and_then(|c| c.parse::<LabelCategory>().ok());

        let mut result = EvaluationResult {
            should_promote: parsed.should_promote,
            reason: non_empty(parsed.reason).unwrap_or_default(),
            display_name: non_empty(parsed.display_name)
                .or_else(|| Some(candidate.display_name.clone())),
            description: non_empty(parsed.description).or_else(|| candidate.description.clone()),
            duplicate_of: non_empty(parsed.duplicate_of).map(|n| normalize_label_name(&n)),
            suggested_category,
            name,
        };
        if result.should_promote && result.name.is_none() {
            result.should_promote = false;
            result.reason = "Evaluation did not produce a valid label name".to_string();
        }

        debug!(
            subsystem = "jobs",
            component = "promotion",
            label = %candidate.name,
            should_promote = result.should_promote,
            duplicate_of = ?result.duplicate_of,
            "Promotion evaluated"
        );
        result
    }

    /// Promote an approved evaluation into every seeded organization.
    ///
    /// Returns `promoted = false` when the verdict is negative or when a system
    /// label with the normalized name already exists in any organization.
    pub async fn promote(
        &self,
        evaluation: &EvaluationResult,
        color: &str,
        retention_days: Option<i32>,
        fallback_category: LabelCategory,
    ) -> Result<PromotionOutcome> {
        let name = match (&evaluation.name, evaluation.should_promote) {
            (Some(name), true) => name.clone(),
            _ => return Ok(PromotionOutcome::declined(evaluation.reason.clone())),
        };

        if self.labels.system_label_exists(&name).await? {
            let reason = Error::AlreadySystemLabel(name.clone()).to_string();
            info!(
                subsystem = "jobs",
                component = "promotion",
                label = %name,
                "Promotion skipped, system label exists"
            );
            return Ok(PromotionOutcome::declined(reason));
        }

        let template = LabelTemplate {
            display_name: evaluation
                .display_name
                .clone()
                .unwrap_or_else(|| name.clone()),
            name,
            description: evaluation.description.clone(),
            color: color.to_string(),
            icon: None,
            category: evaluation.suggested_category.unwrap_or(fallback_category),
            retention_days,
            rag_default: RagStatus::Pending,
        };

        let report = self.propagate(&template).await?;
        Ok(PromotionOutcome {
            promoted: true,
            reason: evaluation.reason.clone(),
            organizations_added: report.inserted,
            organizations_failed: report.failed,
        })
    }

    /// Insert `template` as a system label into every organization that has
    /// system labels, skipping those that already have the name.
    ///
    /// Safe to re-run. One organization's failure does not stop the others.
    pub async fn propagate(&self, template: &LabelTemplate) -> Result<PropagationReport> {
        let organizations = self.labels.organizations_with_system_labels().await?;
        let mut report = PropagationReport::default();

        for organization_id in organizations {
            match self
                .labels
                .insert_if_absent(template.to_system_label(organization_id))
                .await
            {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.already_present += 1,
                Err(e) if e.is_unique_violation() => report.already_present += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "promotion",
                        %organization_id,
                        label = %template.name,
                        error = %e,
                        "Propagation to organization failed"
                    );
                }
            }
        }

        info!(
            subsystem = "jobs",
            component = "promotion",
            op = "propagate",
            label = %template.name,
            inserted = report.inserted,
            already_present = report.already_present,
            failed = report.failed,
            "System label propagated"
        );
        Ok(report)
    }

    /// Evaluate and promote a freshly created custom label. Never fails.
    pub async fn run_for_label(&self, label: &Label) -> PromotionOutcome {
        let evaluation = self.evaluate(&PromotionCandidate::from(label)).await;
        match self
            .promote(&evaluation, &label.color, label.retention_days, label.category)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "promotion",
                    label = %label.name,
                    error = %e,
                    "Promotion failed"
                );
                PromotionOutcome::declined(e.to_string())
            }
        }
    }

    /// Fire-and-forget promotion on the current runtime.
    pub fn spawn_for_label(&self, label: Label) {
        let evaluator = self.clone();
        tokio::spawn(async move {
            let outcome = evaluator.run_for_label(&label).await;
            debug!(
                subsystem = "jobs",
                component = "promotion",
                label = %label.name,
                promoted = outcome.promoted,
                reason = %outcome.reason,
                "Background promotion finished"
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vidcycle_core::{CreateLabelRequest, LabelVocabulary};
    use vidcycle_db::MemoryStore;
    use vidcycle_inference::mock::MockGenerationBackend;

    use crate::catalog::LabelCatalog;

    const APPROVE_PODCAST: &str = r#"{"should_promote": true, "reason": "General format", "name": "podcast", "display_name": "Podcast", "description": "Recorded audio discussion", "duplicate_of": null, "suggested_category": "content_type"}"#;

    async fn seeded_orgs(store: &Arc<MemoryStore>, count: usize) -> Vec<Uuid> {
        let catalog = LabelCatalog::new(store.clone(), Arc::new(LabelVocabulary::default()));
        let mut orgs = Vec::new();
        for _ in 0..count {
            let org = Uuid::new_v4();
            catalog.seed_system_labels(org).await.unwrap();
            orgs.push(org);
        }
        orgs
    }

    fn evaluator(store: &Arc<MemoryStore>, oracle: Option<MockGenerationBackend>) -> PromotionEvaluator {
        PromotionEvaluator::new(
            oracle.map(|o| Arc::new(o) as Arc<dyn GenerationBackend>),
            store.clone(),
        )
    }

    fn candidate(name: &str) -> PromotionCandidate {
        PromotionCandidate {
            name: name.to_string(),
            display_name: "Podcast".to_string(),
            description: None,
            category: LabelCategory::ContentType,
        }
    }

    #[tokio::test]
    async fn test_unconfigured_oracle_never_promotes() {
        let store = MemoryStore::new();
        let result = evaluator(&store, None).evaluate(&candidate("PODCAST")).await;
        assert!(!result.should_promote);
        assert!(result.reason.contains("oracle"));
    }

    #[tokio::test]
    async fn test_evaluation_normalizes_name() {
        let store = MemoryStore::new();
        let oracle = MockGenerationBackend::new().with_fixed_response(APPROVE_PODCAST);
        let result = evaluator(&store, Some(oracle.clone()))
            .evaluate(&candidate("PODCASTS"))
            .await;
        assert!(result.should_promote);
        assert_eq!(result.name.as_deref(), Some("PODCAST"));
        assert_eq!(result.suggested_category, Some(LabelCategory::ContentType));
        assert_eq!(oracle.generate_call_count(), 1);
    }

    #[tokio::test]
    async fn test_evaluation_failure_is_negative_verdict() {
        let store = MemoryStore::new();
        let oracle = MockGenerationBackend::new().failing("timeout");
        let result = evaluator(&store, Some(oracle)).evaluate(&candidate("PODCAST")).await;
        assert!(!result.should_promote);
        assert!(result.reason.contains("timeout"));
    }

    #[tokio::test]
    async fn test_promotion_fans_out_to_seeded_orgs() {
        let store = MemoryStore::new();
        let orgs = seeded_orgs(&store, 3).await;
        let oracle = MockGenerationBackend::new().with_fixed_response(APPROVE_PODCAST);
        let evaluator = evaluator(&store, Some(oracle));

        let evaluation = evaluator.evaluate(&candidate("PODCAST")).await;
        let outcome = evaluator
            .promote(&evaluation, "#123456", Some(30), LabelCategory::ContentType)
            .await
            .unwrap();
        assert!(outcome.promoted);
        assert_eq!(outcome.organizations_added, 3);

        let labels: &dyn LabelRepository = &*store;
        for org in orgs {
            let label = labels
                .find_active_by_name(org, "PODCAST")
                .await
                .unwrap()
                .unwrap();
            assert!(label.is_system);
            assert_eq!(label.retention_days, Some(30));
        }
    }

    #[tokio::test]
    async fn test_existing_system_label_blocks_promotion() {
        let store = MemoryStore::new();
        seeded_orgs(&store, 1).await;
        let evaluator = evaluator(&store, None);
        let evaluation = EvaluationResult {
            should_promote: true,
            reason: "looks general".to_string(),
            name: Some("TUTORIAL".to_string()),
            display_name: Some("Tutorial".to_string()),
            description: None,
            duplicate_of: None,
            suggested_category: None,
        };

        let outcome = evaluator
            .promote(&evaluation, "#000000", None, LabelCategory::ContentType)
            .await
            .unwrap();
        assert!(!outcome.promoted);
        assert!(outcome.reason.contains("already a system label"));
    }

    #[tokio::test]
    async fn test_propagate_is_resumable() {
        let store = MemoryStore::new();
        let orgs = seeded_orgs(&store, 2).await;
        let evaluator = evaluator(&store, None);
        let template = LabelTemplate {
            name: "PODCAST".to_string(),
            display_name: "Podcast".to_string(),
            description: None,
            color: "#111111".to_string(),
            icon: None,
            category: LabelCategory::ContentType,
            retention_days: None,
            rag_default: RagStatus::Pending,
        };

        // First org already has it from an interrupted run.
        let labels: &dyn LabelRepository = &*store;
        labels
            .insert_if_absent(template.to_system_label(orgs[0]))
            .await
            .unwrap();

        let report = evaluator.propagate(&template).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.failed, 0);

        let again = evaluator.propagate(&template).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.already_present, 2);
    }

    #[tokio::test]
    async fn test_run_for_custom_label_skips_unseeded_creator() {
        let store = MemoryStore::new();
        seeded_orgs(&store, 1).await;
        let creator = Uuid::new_v4();
        let catalog = LabelCatalog::new(store.clone(), Arc::new(LabelVocabulary::default()));
        let label = catalog
            .create_custom_label(
                creator,
                CreateLabelRequest {
                    name: "PODCAST".to_string(),
                    display_name: "Podcast".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let oracle = MockGenerationBackend::new().with_fixed_response(APPROVE_PODCAST);
        let outcome = evaluator(&store, Some(oracle)).run_for_label(&label).await;
        assert!(outcome.promoted);
        assert_eq!(outcome.organizations_added, 1);
    }
}
