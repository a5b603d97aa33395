//! HTTP-level tests driving the router over the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use vidcycle_api::{router, AppState};
use vidcycle_core::{defaults, EngineConfig, TranscriptionStatus, Video};
use vidcycle_db::{video_fixture, MemoryAssetStore, MemoryStore, StorageTranscriptSource};
use vidcycle_inference::mock::MockGenerationBackend;
use vidcycle_jobs::LifecycleEngine;

const CRON_SECRET: &str = "test-cron-secret";

const DEMO_REPLY: &str = "```json\n{\"content_type\":{\"primary\":\"DEMO\",\"confidence\":0.9},\"department\":{\"label\":null,\"confidence\":0},\"rag_eligibility\":\"eligible\",\"reasoning\":\"product walkthrough\"}\n```";

struct TestApp {
    app: Router,
    store: Arc<MemoryStore>,
    assets: Arc<MemoryAssetStore>,
    admin: Uuid,
    org: Uuid,
}

fn test_app(oracle: Option<MockGenerationBackend>) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = MemoryStore::new();
    let assets = Arc::new(MemoryAssetStore::new());
    let admin = Uuid::new_v4();
    let repos = store.repositories();

    let mut builder = LifecycleEngine::builder(
        repos.clone(),
        assets.clone(),
        Arc::new(StorageTranscriptSource::new(assets.clone())),
    )
    .with_config(EngineConfig::default().with_admins(vec![admin]));
    if let Some(oracle) = oracle {
        builder = builder.with_oracle(Arc::new(oracle));
    }

    let app = router(AppState {
        engine: builder.build(),
        repos,
        cron_secret: Some(CRON_SECRET.to_string()),
    });
    TestApp {
        app,
        store,
        assets,
        admin,
        org: Uuid::new_v4(),
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    fn request(&self, method: &str, uri: &str, user: Uuid, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", user.to_string())
            .header("x-organization-id", self.org.to_string())
            .header(header::CONTENT_TYPE, "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn transcribed_video(&self) -> Video {
        let mut video = video_fixture(self.org, Utc::now() - Duration::days(2));
        video.transcription_status = Some(TranscriptionStatus::Complete);
        self.assets
            .put(
                format!("{}{}", video.storage_prefix(), defaults::TRANSCRIPT_FILE),
                b"WEBVTT\n\n00:00.000 --> 00:04.000\nHere is the new dashboard\n".to_vec(),
            )
            .await;
        self.store.put_video(video.clone()).await;
        video
    }

    async fn label_id(&self, name: &str) -> String {
        let (_, body) = self
            .send(self.request("GET", "/labels", Uuid::new_v4(), None))
            .await;
        body["labels"]
            .as_array()
            .unwrap()
            .iter()
            .find(|l| l["name"] == name)
            .map(|l| l["id"].as_str().unwrap().to_string())
            .unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let t = test_app(None);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["oracle_configured"], false);
}

#[tokio::test]
async fn test_list_labels_seeds_vocabulary() {
    let t = test_app(None);
    let (status, body) = t
        .send(t.request("GET", "/labels", Uuid::new_v4(), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let labels = body["labels"].as_array().unwrap();
    assert!(labels.iter().any(|l| l["name"] == "TROUBLESHOOTING"));
    assert!(labels.iter().all(|l| l["is_system"] == true));
}

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let t = test_app(None);
    let request = Request::builder()
        .uri("/labels")
        .header("x-organization-id", t.org.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = t.send(request).await;
    // Listing only needs the organization.
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("POST")
        .uri("/labels")
        .header("x-organization-id", t.org.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"name": "PODCAST", "display_name": "Podcast"}).to_string()))
        .unwrap();
    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn test_create_label_validation_and_duplicates() {
    let t = test_app(None);
    let user = Uuid::new_v4();

    let (status, body) = t
        .send(t.request(
            "POST",
            "/labels",
            user,
            Some(json!({"name": "Podcast", "display_name": "Podcast"})),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid label name"));

    let create = json!({"name": "PODCAST", "display_name": "Podcast", "retention_days": 60});
    let (status, body) = t
        .send(t.request("POST", "/labels", user, Some(create.clone())))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["color"], defaults::LABEL_COLOR);
    assert_eq!(body["is_system"], false);

    let (status, _) = t
        .send(t.request("POST", "/labels", user, Some(create)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_classify_assigns_and_sets_eligibility() {
    let t = test_app(Some(
        MockGenerationBackend::new().with_fixed_response(DEMO_REPLY),
    ));
    let video = t.transcribed_video().await;

    let (status, body) = t
        .send(t.request(
            "POST",
            "/classify",
            Uuid::new_v4(),
            Some(json!({"videoId": video.id})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"]["suggestions"][0]["name"], "DEMO");
    assert_eq!(body["classification"]["rag_eligibility"], "eligible");
    assert_eq!(body["assignment"]["assigned"][0], "DEMO");

    let stored = t.store.video(video.id).await.unwrap();
    assert!(stored.ai_classified_at.is_some());
}

#[tokio::test]
async fn test_classify_without_oracle_is_unavailable() {
    let t = test_app(None);
    let video = t.transcribed_video().await;
    let (status, _) = t
        .send(t.request(
            "POST",
            "/classify",
            Uuid::new_v4(),
            Some(json!({"video_id": video.id})),
        ))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_classify_unknown_video_is_not_found() {
    let t = test_app(Some(MockGenerationBackend::new()));
    let (status, _) = t
        .send(t.request(
            "POST",
            "/classify",
            Uuid::new_v4(),
            Some(json!({"videoId": Uuid::new_v4()})),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_video_labels_recomputes_expiration() {
    let t = test_app(None);
    let video = t.transcribed_video().await;
    let quick_note = t.label_id("QUICK_NOTE").await;
    let uri = format!("/videos/{}/labels", video.id);

    let (status, body) = t
        .send(t.request(
            "POST",
            &uri,
            Uuid::new_v4(),
            Some(json!({"labelIds": [quick_note]})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"].as_array().unwrap().len(), 1);
    assert!(body["expires_at"].is_string());

    let (_, body) = t
        .send(t.request(
            "POST",
            &uri,
            Uuid::new_v4(),
            Some(json!({"label_ids": [quick_note], "keep_permanently": true})),
        ))
        .await;
    assert_eq!(body["keep_permanently"], true);
    assert!(body["expires_at"].is_null());

    let (status, body) = t.send(t.request("GET", &uri, Uuid::new_v4(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["labels"][0]["label"]["name"], "QUICK_NOTE");
}

#[tokio::test]
async fn test_cron_requires_secret() {
    let t = test_app(None);
    let request = Request::builder()
        .uri("/cron/cleanup-expired-videos")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .unwrap();
    let (status, _) = t.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_cleanup_reports_deleted_videos() {
    let t = test_app(None);
    let mut video = video_fixture(t.org, Utc::now() - Duration::days(20));
    video.expires_at = Some(Utc::now() - Duration::days(1));
    t.store.put_video(video.clone()).await;

    let request = Request::builder()
        .uri("/cron/cleanup-expired-videos")
        .header(header::AUTHORIZATION, format!("Bearer {}", CRON_SECRET))
        .body(Body::empty())
        .unwrap();
    let (status, body) = t.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);
    assert_eq!(body["errors"], 0);
    assert_eq!(body["details"][0]["status"], "deleted");
    assert_eq!(body["details"][0]["video_id"], video.id.to_string());
    assert!(t.store.video(video.id).await.is_none());
}

#[tokio::test]
async fn test_admin_batch_requires_admin() {
    let t = test_app(Some(MockGenerationBackend::new()));
    let (status, _) = t
        .send(t.request(
            "POST",
            "/admin/classify-all-videos?dryRun=true",
            Uuid::new_v4(),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_dry_run_lists_candidates_without_writes() {
    let oracle = MockGenerationBackend::new().with_fixed_response(DEMO_REPLY);
    let t = test_app(Some(oracle.clone()));
    let video = t.transcribed_video().await;

    let (status, body) = t
        .send(t.request(
            "POST",
            "/admin/classify-all-videos?dryRun=true&limit=10",
            t.admin,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["candidates"], 1);
    assert_eq!(body["videos"][0]["video_id"], video.id.to_string());
    assert_eq!(oracle.generate_call_count(), 0);
    assert!(t.store.video(video.id).await.unwrap().ai_classified_at.is_none());
}
