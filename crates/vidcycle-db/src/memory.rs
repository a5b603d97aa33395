//! In-memory repositories.
//!
//! Mirrors the PostgreSQL implementations closely enough for service and
//! HTTP tests to run without a database: unique constraints, conditional
//! inserts, and the ordering of list queries all match the SQL.
//!
//! Always compiled so downstream crates can use it from their own tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use vidcycle_core::{
    AssignedLabel, AssignmentRepository, ClassificationWrite, CleanupRepository, DeletionStep,
    Error, ExpiredVideo, Label, LabelRepository, NewAssignment, NewLabel, RagStatus, Repositories,
    Result, StepOutcome, TranscriptionStatus, Video, VideoRepository,
};

#[derive(Debug, Clone)]
struct AssignmentRow {
    assigned_by: Uuid,
    assigned_at: DateTime<Utc>,
    is_ai_suggested: bool,
    ai_confidence: Option<f64>,
}

#[derive(Default)]
struct State {
    labels: BTreeMap<Uuid, Label>,
    videos: HashMap<Uuid, Video>,
    assignments: BTreeMap<(Uuid, Uuid), AssignmentRow>,
    comments: Vec<(Uuid, Uuid)>,
    /// (space_id, video_id)
    space_shares: Vec<(Uuid, Uuid)>,
    space_names: HashMap<Uuid, String>,
    direct_shares: Vec<(Uuid, Uuid)>,
    failing_cleanup: HashSet<Uuid>,
}

impl State {
    fn rows_for(&self, step: DeletionStep, video_id: Uuid) -> u64 {
        let count = match step {
            DeletionStep::Comments => self.comments.iter().filter(|(_, v)| *v == video_id).count(),
            DeletionStep::LabelAssignments => self
                .assignments
                .keys()
                .filter(|(v, _)| *v == video_id)
                .count(),
            DeletionStep::SpaceShares => self
                .space_shares
                .iter()
                .filter(|(_, v)| *v == video_id)
                .count(),
            DeletionStep::DirectShares => self
                .direct_shares
                .iter()
                .filter(|(_, v)| *v == video_id)
                .count(),
            DeletionStep::Video => usize::from(self.videos.contains_key(&video_id)),
        };
        count as u64
    }

    fn delete_step(&mut self, step: DeletionStep, video_id: Uuid) {
        match step {
            DeletionStep::Comments => self.comments.retain(|(_, v)| *v != video_id),
            DeletionStep::LabelAssignments => self.assignments.retain(|(v, _), _| *v != video_id),
            DeletionStep::SpaceShares => self.space_shares.retain(|(_, v)| *v != video_id),
            DeletionStep::DirectShares => self.direct_shares.retain(|(_, v)| *v != video_id),
            DeletionStep::Video => {
                self.videos.remove(&video_id);
            }
        }
    }
}

/// In-memory store implementing every repository trait.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this store as the engine's repositories.
    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            labels: self.clone(),
            assignments: self.clone(),
            videos: self.clone(),
            cleanup: self.clone(),
        }
    }

    /// Insert or replace a video row.
    pub async fn put_video(&self, video: Video) {
        self.state.write().await.videos.insert(video.id, video);
    }

    /// Current state of a video, if it still exists.
    pub async fn video(&self, id: Uuid) -> Option<Video> {
        self.state.read().await.videos.get(&id).cloned()
    }

    pub async fn video_count(&self) -> usize {
        self.state.read().await.videos.len()
    }

    pub async fn label_count(&self, organization_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .labels
            .values()
            .filter(|l| l.organization_id == organization_id)
            .count()
    }

    pub async fn add_comment(&self, video_id: Uuid) {
        self.state
            .write()
            .await
            .comments
            .push((Uuid::new_v4(), video_id));
    }

    pub async fn add_space_share(&self, video_id: Uuid) {
        self.state
            .write()
            .await
            .space_shares
            .push((Uuid::new_v4(), video_id));
    }

    /// Share the video into a named space, creating the space.
    pub async fn share_to_space(&self, video_id: Uuid, space_name: &str) -> Uuid {
        let space_id = Uuid::new_v4();
        let mut state = self.state.write().await;
        state.space_names.insert(space_id, space_name.to_string());
        state.space_shares.push((space_id, video_id));
        space_id
    }

    pub async fn add_direct_share(&self, video_id: Uuid) {
        self.state
            .write()
            .await
            .direct_shares
            .push((Uuid::new_v4(), video_id));
    }

    /// Rows still referencing a video across all dependent tables.
    pub async fn dependent_rows(&self, video_id: Uuid) -> u64 {
        let state = self.state.read().await;
        [
            DeletionStep::Comments,
            DeletionStep::LabelAssignments,
            DeletionStep::SpaceShares,
            DeletionStep::DirectShares,
        ]
        .into_iter()
        .map(|step| state.rows_for(step, video_id))
        .sum()
    }

    /// Make row deletion for this video fail, leaving its rows in place.
    pub async fn fail_cleanup_for(&self, video_id: Uuid) {
        self.state.write().await.failing_cleanup.insert(video_id);
    }
}

/// A fresh video row with default lifecycle fields.
pub fn video_fixture(organization_id: Uuid, created_at: DateTime<Utc>) -> Video {
    Video {
        id: Uuid::now_v7(),
        organization_id,
        owner_id: Uuid::new_v4(),
        name: "Untitled recording".to_string(),
        duration_seconds: Some(120.0),
        ai_summary: None,
        transcription_status: None,
        rag_status: RagStatus::Pending,
        rag_status_updated_at: None,
        rag_status_updated_by: None,
        keep_permanently: false,
        expires_at: None,
        ai_suggested_labels: None,
        ai_classified_at: None,
        created_at,
    }
}

fn materialize(label: NewLabel) -> Label {
    Label {
        id: Uuid::now_v7(),
        organization_id: label.organization_id,
        name: label.name,
        display_name: label.display_name,
        description: label.description,
        color: label.color,
        icon: label.icon,
        category: label.category,
        retention_days: label.retention_days,
        rag_default: label.rag_default,
        is_system: label.is_system,
        is_active: true,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl LabelRepository for MemoryStore {
    async fn insert(&self, label: NewLabel) -> Result<Label> {
        let mut state = self.state.write().await;
        let exists = state
            .labels
            .values()
            .any(|l| l.organization_id == label.organization_id && l.name == label.name);
        if exists {
            return Err(Error::DuplicateLabelName {
                organization_id: label.organization_id,
                name: label.name,
            });
        }
        let label = materialize(label);
        state.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn insert_if_absent(&self, label: NewLabel) -> Result<bool> {
        let mut state = self.state.write().await;
        let exists = state
            .labels
            .values()
            .any(|l| l.organization_id == label.organization_id && l.name == label.name);
        if exists {
            return Ok(false);
        }
        let label = materialize(label);
        state.labels.insert(label.id, label);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Label> {
        self.state
            .read()
            .await
            .labels
            .get(&id)
            .cloned()
            .ok_or(Error::LabelNotFound(id))
    }

    async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Label>> {
        let state = self.state.read().await;
        let mut labels: Vec<Label> = state
            .labels
            .values()
            .filter(|l| l.organization_id == organization_id && l.is_active)
            .cloned()
            .collect();
        labels.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(labels)
    }

    async fn find_active_by_name(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Label>> {
        Ok(self
            .state
            .read()
            .await
            .labels
            .values()
            .find(|l| l.organization_id == organization_id && l.name == name && l.is_active)
            .cloned())
    }

    async fn has_active_system_labels(&self, organization_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .labels
            .values()
            .any(|l| l.organization_id == organization_id && l.is_system && l.is_active))
    }

    async fn system_label_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .labels
            .values()
            .any(|l| l.is_system && l.name == name))
    }

    async fn list_system_label_names(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .labels
            .values()
            .filter(|l| l.is_system)
            .map(|l| l.name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn organizations_with_system_labels(&self) -> Result<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut orgs: Vec<Uuid> = state
            .labels
            .values()
            .filter(|l| l.is_system)
            .map(|l| l.organization_id)
            .collect();
        orgs.sort();
        orgs.dedup();
        Ok(orgs)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let label = state.labels.get_mut(&id).ok_or(Error::LabelNotFound(id))?;
        label.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl AssignmentRepository for MemoryStore {
    async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<AssignedLabel>> {
        let state = self.state.read().await;
        let mut assigned: Vec<AssignedLabel> = state
            .assignments
            .iter()
            .filter(|((v, _), _)| *v == video_id)
            .filter_map(|((_, label_id), row)| {
                state.labels.get(label_id).map(|label| AssignedLabel {
                    label: label.clone(),
                    assigned_by: row.assigned_by,
                    assigned_at: row.assigned_at,
                    is_ai_suggested: row.is_ai_suggested,
                    ai_confidence: row.ai_confidence,
                })
            })
            .collect();
        assigned.sort_by(|a, b| {
            a.label
                .category
                .cmp(&b.label.category)
                .then_with(|| a.label.display_name.cmp(&b.label.display_name))
        });
        Ok(assigned)
    }

    async fn insert_if_absent(&self, assignment: NewAssignment) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.videos.contains_key(&assignment.video_id) {
            return Err(Error::VideoNotFound(assignment.video_id));
        }
        if !state.labels.contains_key(&assignment.label_id) {
            return Err(Error::LabelNotFound(assignment.label_id));
        }
        let key = (assignment.video_id, assignment.label_id);
        if state.assignments.contains_key(&key) {
            return Ok(false);
        }
        state.assignments.insert(
            key,
            AssignmentRow {
                assigned_by: assignment.assigned_by,
                assigned_at: Utc::now(),
                is_ai_suggested: assignment.is_ai_suggested,
                ai_confidence: assignment.ai_confidence,
            },
        );
        Ok(true)
    }

    async fn remove(&self, video_id: Uuid, label_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .write()
            .await
            .assignments
            .remove(&(video_id, label_id))
            .is_some())
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Video> {
        self.state
            .read()
            .await
            .videos
            .get(&id)
            .cloned()
            .ok_or(Error::VideoNotFound(id))
    }

    async fn save_classification(&self, video_id: Uuid, write: ClassificationWrite) -> Result<()> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(&video_id)
            .ok_or(Error::VideoNotFound(video_id))?;
        video.ai_suggested_labels = Some(write.suggestions);
        video.ai_classified_at = Some(write.classified_at);
        video.rag_status = write.rag_status;
        video.rag_status_updated_at = Some(write.classified_at);
        video.rag_status_updated_by = Some(write.actor_id);
        Ok(())
    }

    async fn set_expiration(
        &self,
        video_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(&video_id)
            .ok_or(Error::VideoNotFound(video_id))?;
        video.expires_at = expires_at;
        Ok(())
    }

    async fn set_keep_permanently(&self, video_id: Uuid, keep: bool) -> Result<()> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(&video_id)
            .ok_or(Error::VideoNotFound(video_id))?;
        video.keep_permanently = keep;
        Ok(())
    }

    async fn set_transcription_status(
        &self,
        video_id: Uuid,
        status: TranscriptionStatus,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(&video_id)
            .ok_or(Error::VideoNotFound(video_id))?;
        if !TranscriptionStatus::can_transition(video.transcription_status, status) {
            return Err(Error::InvalidInput(format!(
                "Cannot move transcription from {} to {}",
                video
                    .transcription_status
                    .map(|s| s.as_str())
                    .unwrap_or("unset"),
                status
            )));
        }
        video.transcription_status = Some(status);
        Ok(())
    }

    async fn mark_transcription_failed(&self, video_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let video = state
            .videos
            .get_mut(&video_id)
            .ok_or(Error::VideoNotFound(video_id))?;
        video.transcription_status = None;
        Ok(())
    }

    async fn list_space_names(&self, video_id: Uuid) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .space_shares
            .iter()
            .filter(|(_, v)| *v == video_id)
            .filter_map(|(space_id, _)| state.space_names.get(space_id).cloned())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn list_unclassified(&self, limit: i64) -> Result<Vec<Video>> {
        let state = self.state.read().await;
        let mut videos: Vec<Video> = state
            .videos
            .values()
            .filter(|v| {
                v.transcription_status == Some(TranscriptionStatus::Complete)
                    && v.ai_classified_at.is_none()
            })
            .cloned()
            .collect();
        videos.sort_by_key(|v| v.created_at);
        videos.truncate(limit.max(0) as usize);
        Ok(videos)
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ExpiredVideo>> {
        let state = self.state.read().await;
        let mut expired: Vec<ExpiredVideo> = state
            .videos
            .values()
            .filter(|v| v.is_cleanup_eligible(now))
            .filter_map(|v| {
                v.expires_at.map(|expires_at| ExpiredVideo {
                    id: v.id,
                    owner_id: v.owner_id,
                    name: v.name.clone(),
                    expires_at,
                })
            })
            .collect();
        expired.sort_by_key(|v| v.expires_at);
        Ok(expired)
    }
}

#[async_trait]
impl CleanupRepository for MemoryStore {
    async fn delete_video_rows(
        &self,
        video_id: Uuid,
        now: DateTime<Utc>,
        steps: &[DeletionStep],
    ) -> Result<Option<Vec<StepOutcome>>> {
        // The write lock spans the check and every step, so the deletion is all-or-nothing.
        let mut state = self.state.write().await;
        if state.failing_cleanup.contains(&video_id) {
            return Err(Error::Internal(format!(
                "row deletion failed for video {}",
                video_id
            )));
        }
        let eligible = state
            .videos
            .get(&video_id)
            .is_some_and(|v| v.is_cleanup_eligible(now));
        if !eligible {
            return Ok(None);
        }
        let outcomes = steps
            .iter()
            .map(|step| {
                let rows = state.rows_for(*step, video_id);
                state.delete_step(*step, video_id);
                StepOutcome { step: *step, rows }
            })
            .collect();
        Ok(Some(outcomes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidcycle_core::{LabelCategory, DELETION_PIPELINE};

    fn new_label(org: Uuid, name: &str, is_system: bool) -> NewLabel {
        NewLabel {
            organization_id: org,
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
            color: "#6B7280".to_string(),
            icon: None,
            category: LabelCategory::ContentType,
            retention_days: None,
            rag_default: RagStatus::Pending,
            is_system,
        }
    }

    #[tokio::test]
    async fn test_label_name_unique_per_org() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        store.insert(new_label(org, "DEMO", false)).await.unwrap();
        let err = store.insert(new_label(org, "DEMO", false)).await.unwrap_err();
        assert!(err.is_unique_violation());

        // Same name in another organization is fine.
        store
            .insert(new_label(Uuid::new_v4(), "DEMO", false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_if_absent_reports_insert() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let labels: &dyn LabelRepository = &*store;
        assert!(labels.insert_if_absent(new_label(org, "DEMO", true)).await.unwrap());
        assert!(!labels.insert_if_absent(new_label(org, "DEMO", true)).await.unwrap());
        assert_eq!(store.label_count(org).await, 1);
    }

    #[tokio::test]
    async fn test_list_active_excludes_inactive_and_sorts() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let mut dept = new_label(org, "TECH", true);
        dept.category = LabelCategory::Department;
        store.insert(dept).await.unwrap();
        store.insert(new_label(org, "TUTORIAL", true)).await.unwrap();
        let demo = store.insert(new_label(org, "DEMO", true)).await.unwrap();
        let hidden = store.insert(new_label(org, "HIDDEN", false)).await.unwrap();
        store.set_active(hidden.id, false).await.unwrap();

        let names: Vec<String> = store
            .list_active(org)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["DEMO", "TUTORIAL", "TECH"]);
        assert!(store.find_active_by_name(org, "HIDDEN").await.unwrap().is_none());
        assert_eq!(
            store.find_active_by_name(org, "DEMO").await.unwrap().map(|l| l.id),
            Some(demo.id)
        );
    }

    #[tokio::test]
    async fn test_list_expired_respects_keep_permanently() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let now = Utc::now();

        let mut expired = video_fixture(org, now);
        expired.expires_at = Some(now - chrono::Duration::hours(1));
        let mut kept = video_fixture(org, now);
        kept.expires_at = Some(now - chrono::Duration::hours(1));
        kept.keep_permanently = true;
        let mut future = video_fixture(org, now);
        future.expires_at = Some(now + chrono::Duration::days(1));
        let never = video_fixture(org, now);

        let expired_id = expired.id;
        for v in [expired, kept, future, never] {
            store.put_video(v).await;
        }

        let ids: Vec<Uuid> = store
            .list_expired(now)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![expired_id]);
    }

    #[tokio::test]
    async fn test_delete_video_rows_counts_each_step() {
        let store = MemoryStore::new();
        let org = Uuid::new_v4();
        let now = Utc::now();
        let mut video = video_fixture(org, now - chrono::Duration::days(10));
        video.expires_at = Some(now);
        let video_id = video.id;
        store.put_video(video).await;
        store.add_comment(video_id).await;
        store.add_comment(video_id).await;
        store.add_space_share(video_id).await;

        let outcomes = store
            .delete_video_rows(video_id, now, &DELETION_PIPELINE)
            .await
            .unwrap()
            .unwrap();
        let rows: Vec<u64> = outcomes.iter().map(|o| o.rows).collect();
        assert_eq!(rows, vec![2, 0, 1, 0, 1]);
        assert!(store.video(video_id).await.is_none());
        assert_eq!(store.dependent_rows(video_id).await, 0);

        // Second run finds nothing to delete.
        let again = store
            .delete_video_rows(video_id, now, &DELETION_PIPELINE)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_delete_video_rows_rechecks_eligibility() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut video = video_fixture(Uuid::new_v4(), now - chrono::Duration::days(10));
        video.expires_at = Some(now - chrono::Duration::days(1));
        let video_id = video.id;
        store.put_video(video).await;
        store.add_comment(video_id).await;

        store.set_keep_permanently(video_id, true).await.unwrap();
        let kept = store
            .delete_video_rows(video_id, now, &DELETION_PIPELINE)
            .await
            .unwrap();
        assert!(kept.is_none());
        assert!(store.video(video_id).await.is_some());
        assert_eq!(store.dependent_rows(video_id).await, 1);

        store.set_keep_permanently(video_id, false).await.unwrap();
        store
            .set_expiration(video_id, Some(now + chrono::Duration::days(5)))
            .await
            .unwrap();
        let extended = store
            .delete_video_rows(video_id, now, &DELETION_PIPELINE)
            .await
            .unwrap();
        assert!(extended.is_none());
        assert!(store.video(video_id).await.is_some());
    }

    #[tokio::test]
    async fn test_space_names_sorted_and_deduplicated() {
        let store = MemoryStore::new();
        let video = video_fixture(Uuid::new_v4(), Utc::now());
        let id = video.id;
        store.put_video(video).await;
        store.share_to_space(id, "Support").await;
        store.share_to_space(id, "Engineering").await;
        store.share_to_space(id, "Support").await;
        store.add_space_share(id).await;
        store.share_to_space(Uuid::new_v4(), "Sales").await;

        let names = store.list_space_names(id).await.unwrap();
        assert_eq!(names, vec!["Engineering".to_string(), "Support".to_string()]);
    }

    #[tokio::test]
    async fn test_transcription_transitions() {
        let store = MemoryStore::new();
        let video = video_fixture(Uuid::new_v4(), Utc::now());
        let id = video.id;
        store.put_video(video).await;

        assert!(store
            .set_transcription_status(id, TranscriptionStatus::Complete)
            .await
            .is_err());
        store
            .set_transcription_status(id, TranscriptionStatus::Processing)
            .await
            .unwrap();
        store
            .set_transcription_status(id, TranscriptionStatus::Complete)
            .await
            .unwrap();
        assert!(store
            .set_transcription_status(id, TranscriptionStatus::Processing)
            .await
            .is_err());
    }
}
