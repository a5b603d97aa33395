//! PostgreSQL integration tests for the lifecycle repositories.
//!
//! Require a migrated database at `DATABASE_URL`. Run with:
//! `cargo test -p vidcycle-db -- --ignored`

use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use vidcycle_db::{
    AssignmentRepository, CleanupRepository, LabelCategory, LabelRepository, NewAssignment,
    NewLabel, RagStatus, TranscriptionStatus, VideoRepository, DELETION_PIPELINE,
    DEFAULT_TEST_DATABASE_URL,
};
use vidcycle_db::{PgAssignmentRepository, PgCleanupRepository, PgLabelRepository, PgVideoRepository};

async fn setup_test_db() -> PgPool {
    let _ = dotenvy::dotenv();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

async fn insert_video(pool: &PgPool, org: Uuid, created_at: chrono::DateTime<Utc>) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO video (id, organization_id, owner_id, name, created_at)
         VALUES ($1, $2, $3, 'pg test', $4)",
    )
    .bind(id)
    .bind(org)
    .bind(Uuid::new_v4())
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to insert video");
    id
}

/// Expire the video and run the deletion pipeline over it.
async fn remove_video(pool: &PgPool, video_id: Uuid) {
    sqlx::query(
        "UPDATE video SET expires_at = NOW() - INTERVAL '1 day', keep_permanently = FALSE
         WHERE id = $1",
    )
    .bind(video_id)
    .execute(pool)
    .await
    .expect("Failed to expire video");
    PgCleanupRepository::new(pool.clone())
        .delete_video_rows(video_id, Utc::now(), &DELETION_PIPELINE)
        .await
        .expect("Failed to delete video rows");
}

fn label(org: Uuid, name: &str, retention_days: Option<i32>) -> NewLabel {
    NewLabel {
        organization_id: org,
        name: name.to_string(),
        display_name: name.to_string(),
        description: None,
        color: "#6B7280".to_string(),
        icon: None,
        category: LabelCategory::ContentType,
        retention_days,
        rag_default: RagStatus::Pending,
        is_system: false,
    }
}

#[tokio::test]
#[ignore]
async fn test_duplicate_label_name_maps_to_domain_error() {
    let pool = setup_test_db().await;
    let labels = PgLabelRepository::new(pool.clone());
    let org = Uuid::new_v4();

    labels.insert(label(org, "DEMO", None)).await.unwrap();
    let err = labels.insert(label(org, "DEMO", None)).await.unwrap_err();
    assert!(err.is_unique_violation());
    assert!(!labels.insert_if_absent(label(org, "DEMO", None)).await.unwrap());

    sqlx::query("DELETE FROM label WHERE organization_id = $1")
        .bind(org)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_assignment_insert_is_idempotent() {
    let pool = setup_test_db().await;
    let labels = PgLabelRepository::new(pool.clone());
    let assignments = PgAssignmentRepository::new(pool.clone());
    let org = Uuid::new_v4();

    let video_id = insert_video(&pool, org, Utc::now()).await;
    let demo = labels.insert(label(org, "DEMO", None)).await.unwrap();
    let assignment = NewAssignment {
        video_id,
        label_id: demo.id,
        assigned_by: Uuid::new_v4(),
        is_ai_suggested: true,
        ai_confidence: Some(0.9),
    };

    assert!(assignments.insert_if_absent(assignment.clone()).await.unwrap());
    assert!(!assignments.insert_if_absent(assignment).await.unwrap());
    assert_eq!(assignments.list_for_video(video_id).await.unwrap().len(), 1);

    remove_video(&pool, video_id).await;
    sqlx::query("DELETE FROM label WHERE organization_id = $1")
        .bind(org)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore]
async fn test_expired_selection_and_row_deletion() {
    let pool = setup_test_db().await;
    let videos = PgVideoRepository::new(pool.clone());
    let cleanup = PgCleanupRepository::new(pool.clone());
    let org = Uuid::new_v4();
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let expired = insert_video(&pool, org, created).await;
    let kept = insert_video(&pool, org, created).await;
    let past = Utc::now() - Duration::days(1);
    videos.set_expiration(expired, Some(past)).await.unwrap();
    videos.set_expiration(kept, Some(past)).await.unwrap();
    videos.set_keep_permanently(kept, true).await.unwrap();

    sqlx::query(
        "INSERT INTO comment (id, video_id, author_id, content) VALUES ($1, $2, $3, 'hi')",
    )
    .bind(Uuid::now_v7())
    .bind(expired)
    .bind(Uuid::new_v4())
    .execute(&pool)
    .await
    .unwrap();

    let ids: Vec<Uuid> = videos
        .list_expired(Utc::now())
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert!(ids.contains(&expired));
    assert!(!ids.contains(&kept));

    let now = Utc::now();
    let outcomes = cleanup
        .delete_video_rows(expired, now, &DELETION_PIPELINE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcomes[0].rows, 1);
    assert_eq!(outcomes.last().map(|o| o.rows), Some(1));
    assert!(videos.get(expired).await.is_err());

    let refused = cleanup
        .delete_video_rows(kept, now, &DELETION_PIPELINE)
        .await
        .unwrap();
    assert!(refused.is_none());
    assert!(videos.get(kept).await.is_ok());

    remove_video(&pool, kept).await;
}

#[tokio::test]
#[ignore]
async fn test_keep_flag_set_after_selection_blocks_deletion() {
    let pool = setup_test_db().await;
    let videos = PgVideoRepository::new(pool.clone());
    let cleanup = PgCleanupRepository::new(pool.clone());
    let video_id = insert_video(&pool, Uuid::new_v4(), Utc::now() - Duration::days(30)).await;
    videos
        .set_expiration(video_id, Some(Utc::now() - Duration::days(1)))
        .await
        .unwrap();

    let now = Utc::now();
    let selected: Vec<Uuid> = videos
        .list_expired(now)
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.id)
        .collect();
    assert!(selected.contains(&video_id));

    videos.set_keep_permanently(video_id, true).await.unwrap();
    let outcome = cleanup
        .delete_video_rows(video_id, now, &DELETION_PIPELINE)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(videos.get(video_id).await.unwrap().keep_permanently);

    remove_video(&pool, video_id).await;
}

#[tokio::test]
#[ignore]
async fn test_transcription_compare_and_set() {
    let pool = setup_test_db().await;
    let videos = PgVideoRepository::new(pool.clone());
    let video_id = insert_video(&pool, Uuid::new_v4(), Utc::now()).await;

    videos
        .set_transcription_status(video_id, TranscriptionStatus::Processing)
        .await
        .unwrap();
    assert!(videos
        .set_transcription_status(video_id, TranscriptionStatus::Pending)
        .await
        .is_err());
    videos.mark_transcription_failed(video_id).await.unwrap();
    assert_eq!(videos.get(video_id).await.unwrap().transcription_status, None);

    remove_video(&pool, video_id).await;
}

#[tokio::test]
#[ignore]
async fn test_space_names_for_video() {
    let pool = setup_test_db().await;
    let videos = PgVideoRepository::new(pool.clone());
    let org = Uuid::new_v4();
    let video_id = insert_video(&pool, org, Utc::now()).await;

    for name in ["Support", "Engineering"] {
        let space_id = Uuid::now_v7();
        sqlx::query("INSERT INTO space (id, organization_id, name) VALUES ($1, $2, $3)")
            .bind(space_id)
            .bind(org)
            .bind(name)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO space_video (id, space_id, video_id, added_by) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(space_id)
        .bind(video_id)
        .bind(Uuid::new_v4())
        .execute(&pool)
        .await
        .unwrap();
    }

    let names = videos.list_space_names(video_id).await.unwrap();
    assert_eq!(names, vec!["Engineering".to_string(), "Support".to_string()]);

    remove_video(&pool, video_id).await;
    sqlx::query("DELETE FROM space WHERE organization_id = $1")
        .bind(org)
        .execute(&pool)
        .await
        .unwrap();
}
