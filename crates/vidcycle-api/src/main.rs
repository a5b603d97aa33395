//! vidcycle-api - HTTP API server for vidcycle

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use vidcycle_api::{logging, router, AppState};
use vidcycle_core::{AssetStore, EngineConfig, GenerationBackend, LabelVocabulary};
use vidcycle_db::{Database, FilesystemAssetStore, PoolConfig, StorageTranscriptSource};
use vidcycle_inference::OpenAIBackend;
use vidcycle_jobs::LifecycleEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let log_config = logging::LogConfig::from_env();
    let _file_guard = logging::init(&log_config);
    info!(
        log_format = %log_config.format,
        log_file = log_config.file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/vidcycle".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);
    let cron_secret = std::env::var("CRON_SECRET").ok().filter(|s| !s.is_empty());
    if cron_secret.is_none() {
        warn!("CRON_SECRET not set; the cleanup endpoint will refuse every call");
    }

    let config = EngineConfig::from_env();
    let vocabulary = LabelVocabulary::from_env()?;
    info!(
        content_types = vocabulary.content_types.len(),
        departments = vocabulary.departments.len(),
        admins = config.admin_user_ids.len(),
        threshold = config.confidence_threshold,
        "Engine configured"
    );

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect_with_config(&database_url, PoolConfig::from_env()).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let assets: Arc<dyn AssetStore> = Arc::new(FilesystemAssetStore::from_env());
    let transcripts = Arc::new(StorageTranscriptSource::new(assets.clone()));

    let oracle: Option<Arc<dyn GenerationBackend>> = match OpenAIBackend::from_env_if_configured()? {
        Some(backend) => {
            info!(model = backend.model_name(), "Classification oracle configured");
            Some(Arc::new(backend))
        }
        None => {
            warn!("No classification oracle configured; classification and promotion are disabled");
            None
        }
    };

    let repos = db.repositories();
    let engine = LifecycleEngine::builder(repos.clone(), assets, transcripts)
        .with_optional_oracle(oracle)
        .with_vocabulary(vocabulary)
        .with_config(config)
        .build();

    let app = router(AppState {
        engine,
        repos,
        cron_secret,
    });

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
