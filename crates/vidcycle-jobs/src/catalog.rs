//! Label catalog: system seeding, custom labels, listing.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use vidcycle_core::{
    defaults, validate_create_request, CreateLabelRequest, Error, Label, LabelRepository,
    LabelVocabulary, NewLabel, RagStatus, Result,
};

/// Outcome of seeding an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SeedOutcome {
    /// Labels written by this call.
    pub inserted: usize,
    /// True when the organization already had system labels and nothing ran.
    pub already_seeded: bool,
}

/// Organization-scoped label definitions.
#[derive(Clone)]
pub struct LabelCatalog {
    labels: Arc<dyn LabelRepository>,
    vocabulary: Arc<LabelVocabulary>,
}

impl LabelCatalog {
    pub fn new(labels: Arc<dyn LabelRepository>, vocabulary: Arc<LabelVocabulary>) -> Self {
        Self { labels, vocabulary }
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// Seed the system vocabulary for an organization.
    ///
    /// No-op when any active system label exists. Concurrent callers race on
    /// the `(organization_id, name)` constraint; losing an insert counts as done.
    pub async fn seed_system_labels(&self, organization_id: Uuid) -> Result<SeedOutcome> {
        if self.labels.has_active_system_labels(organization_id).await? {
            debug!(
                subsystem = "jobs",
                component = "catalog",
                %organization_id,
                "System labels already seeded"
            );
            return Ok(SeedOutcome {
                inserted: 0,
                already_seeded: true,
            });
        }

        let mut inserted = 0;
        for template in self.vocabulary.all() {
            match self
                .labels
                .insert_if_absent(template.to_system_label(organization_id))
                .await
            {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) if e.is_unique_violation() => {}
                Err(e) => return Err(e),
            }
        }

        info!(
            subsystem = "jobs",
            component = "catalog",
            op = "seed",
            %organization_id,
            inserted,
            "Seeded system labels"
        );
        Ok(SeedOutcome {
            inserted,
            already_seeded: false,
        })
    }

    /// Create a user label. Fails with `InvalidLabelName` or `DuplicateLabelName`.
    pub async fn create_custom_label(
        &self,
        organization_id: Uuid,
        request: CreateLabelRequest,
    ) -> Result<Label> {
        validate_create_request(&request)?;

        let label = NewLabel {
            organization_id,
            name: request.name,
            display_name: request.display_name.trim().to_string(),
            description: request
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            color: request
                .color
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| defaults::LABEL_COLOR.to_string()),
            icon: request.icon,
            category: request.category.unwrap_or_default(),
            retention_days: request.retention_days,
            rag_default: RagStatus::Pending,
            is_system: false,
        };

        let created = self.labels.insert(label).await?;
        info!(
            subsystem = "jobs",
            component = "catalog",
            op = "create",
            %organization_id,
            label = %created.name,
            "Custom label created"
        );
        Ok(created)
    }

    /// Active labels ordered by (category, display name).
    pub async fn list_active_labels(&self, organization_id: Uuid) -> Result<Vec<Label>> {
        self.labels.list_active(organization_id).await
    }

    /// Soft-delete a label. Existing assignments stay; it is no longer listed or auto-assigned.
    pub async fn deactivate_label(&self, organization_id: Uuid, label_id: Uuid) -> Result<Label> {
        let label = self.labels.get(label_id).await?;
        if label.organization_id != organization_id {
            return Err(Error::LabelNotFound(label_id));
        }
        if !label.is_active {
            return Ok(label);
        }
        self.labels.set_active(label_id, false).await?;
        if label.is_system {
            warn!(
                subsystem = "jobs",
                component = "catalog",
                %organization_id,
                label = %label.name,
                "System label deactivated"
            );
        }
        Ok(Label {
            is_active: false,
            ..label
        })
    }
}
