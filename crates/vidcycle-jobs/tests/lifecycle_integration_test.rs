//! End-to-end lifecycle tests over the in-memory store.
//!
//! This test suite validates:
//! - A classified video picks up labels and an expiration
//! - Keeping a video permanently protects it from cleanup
//! - An expired video is removed along with its assets and dependents
//! - Promotion runs against the same store the catalog writes to

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use vidcycle_db::{video_fixture, MemoryAssetStore, MemoryStore, StorageTranscriptSource};
use vidcycle_inference::mock::MockGenerationBackend;
use vidcycle_jobs::{
    defaults, CleanupStatus, CreateLabelRequest, EngineConfig, LabelUpdate, LifecycleEngine,
    TranscriptionStatus, Video,
};

const QUICK_NOTE_REPLY: &str = "```json\n{\"content_type\":{\"primary\":\"QUICK_NOTE\",\"confidence\":0.88},\"department\":{\"label\":\"SUPPORT\",\"confidence\":0.6},\"rag_eligibility\":\"excluded\",\"reasoning\":\"short reminder\"}\n```";

const PROMOTE_REPLY: &str = r#"{"should_promote": true, "reason": "Common format", "name": "WEBINAR", "display_name": "Webinar", "description": "Hosted online session", "duplicate_of": null, "suggested_category": "content_type"}"#;

struct Harness {
    store: Arc<MemoryStore>,
    assets: Arc<MemoryAssetStore>,
    engine: LifecycleEngine,
    org: Uuid,
}

async fn harness() -> Harness {
    let store = MemoryStore::new();
    let assets = Arc::new(MemoryAssetStore::new());
    let oracle = MockGenerationBackend::new()
        .with_response_containing("curate a shared vocabulary", PROMOTE_REPLY)
        .with_fixed_response(QUICK_NOTE_REPLY);

    let engine = LifecycleEngine::builder(
        store.repositories(),
        assets.clone(),
        Arc::new(StorageTranscriptSource::new(assets.clone())),
    )
    .with_oracle(Arc::new(oracle))
    .with_config(EngineConfig::default())
    .build();

    let org = Uuid::new_v4();
    engine.catalog.seed_system_labels(org).await.unwrap();
    Harness {
        store,
        assets,
        engine,
        org,
    }
}

async fn recorded_video(h: &Harness, created_at: chrono::DateTime<Utc>) -> Video {
    let mut video = video_fixture(h.org, created_at);
    video.transcription_status = Some(TranscriptionStatus::Complete);
    let prefix = video.storage_prefix();
    h.assets
        .put(
            format!("{}{}", prefix, defaults::TRANSCRIPT_FILE),
            b"WEBVTT\n\n00:00:00.000 --> 00:00:03.000\nRemember to restart the router\n".to_vec(),
        )
        .await;
    h.assets.put(format!("{}result.mp4", prefix), b"mp4".to_vec()).await;
    h.store.put_video(video.clone()).await;
    video
}

#[tokio::test]
async fn test_classification_sets_expiration_from_created_at() {
    let h = harness().await;
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let video = recorded_video(&h, created).await;

    let outcome = h
        .engine
        .pipeline
        .classify_video(video.id, Uuid::nil())
        .await
        .unwrap();

    let assignment = outcome.assignment.unwrap();
    assert_eq!(assignment.assigned, vec!["QUICK_NOTE".to_string()]);
    assert_eq!(
        assignment.expires_at,
        Some(Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap())
    );

    let labels = h.engine.assignments.video_labels(video.id).await.unwrap();
    assert_eq!(labels.labels.len(), 1);
    assert!(labels.labels[0].is_ai_suggested);
}

#[tokio::test]
async fn test_expired_video_is_cleaned_up_unless_kept() {
    let h = harness().await;
    let now = Utc::now();
    let doomed = recorded_video(&h, now - Duration::days(10)).await;
    let kept = recorded_video(&h, now - Duration::days(10)).await;

    for video in [&doomed, &kept] {
        h.engine
            .pipeline
            .classify_video(video.id, Uuid::nil())
            .await
            .unwrap();
    }
    h.store.add_comment(doomed.id).await;

    let current = h.engine.assignments.video_labels(kept.id).await.unwrap();
    h.engine
        .assignments
        .set_video_labels(
            kept.id,
            LabelUpdate {
                label_ids: current.labels.iter().map(|a| a.label.id).collect(),
                keep_permanently: Some(true),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    let report = h.engine.cleanup.run(now).await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.details[0].video_id, doomed.id);
    assert_eq!(report.details[0].status, CleanupStatus::Deleted);
    assert_eq!(report.details[0].assets_removed, 2);

    assert!(h.store.video(doomed.id).await.is_none());
    assert_eq!(h.store.dependent_rows(doomed.id).await, 0);
    assert!(h.store.video(kept.id).await.is_some());
}

#[tokio::test]
async fn test_custom_label_promotion_reaches_other_orgs() {
    let h = harness().await;
    let other_org = Uuid::new_v4();
    h.engine.catalog.seed_system_labels(other_org).await.unwrap();

    let label = h
        .engine
        .catalog
        .create_custom_label(
            h.org,
            CreateLabelRequest {
                name: "WEBINAR".to_string(),
                display_name: "Webinar".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The creator's own custom label holds the name, so only the other org gains one.
    let outcome = h.engine.promotion.run_for_label(&label).await;
    assert!(outcome.promoted);
    assert_eq!(outcome.organizations_added, 1);

    let listed = h.engine.catalog.list_active_labels(other_org).await.unwrap();
    assert!(listed.iter().any(|l| l.name == "WEBINAR" && l.is_system));
}
