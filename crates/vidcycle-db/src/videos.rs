//! Video lifecycle repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgArguments, PgRow},
    Pool, Postgres, Row,
};
use tracing::debug;
use uuid::Uuid;

use vidcycle_core::{
    ClassificationWrite, Error, ExpiredVideo, LabelSuggestion, Result, TranscriptionStatus, Video,
    VideoRepository,
};

const VIDEO_COLUMNS: &str = "id, organization_id, owner_id, name, duration_seconds, ai_summary, \
     transcription_status, rag_status, rag_status_updated_at, rag_status_updated_by, \
     keep_permanently, expires_at, ai_suggested_labels, ai_classified_at, created_at";

/// PostgreSQL implementation of VideoRepository.
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: Pool<Postgres>,
}

impl PgVideoRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_video_row(row: &PgRow) -> Video {
        let suggestions: Option<serde_json::Value> = row.get("ai_suggested_labels");
        Video {
            id: row.get("id"),
            organization_id: row.get("organization_id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            duration_seconds: row.get("duration_seconds"),
            ai_summary: row.get("ai_summary"),
            transcription_status: row
                .get::<Option<String>, _>("transcription_status")
                .and_then(|s| s.parse().ok()),
            rag_status: row
                .get::<String, _>("rag_status")
                .parse()
                .unwrap_or_default(),
            rag_status_updated_at: row.get("rag_status_updated_at"),
            rag_status_updated_by: row.get("rag_status_updated_by"),
            keep_permanently: row.get("keep_permanently"),
            expires_at: row.get("expires_at"),
            ai_suggested_labels: suggestions
                .and_then(|v| serde_json::from_value::<Vec<LabelSuggestion>>(v).ok()),
            ai_classified_at: row.get("ai_classified_at"),
            created_at: row.get("created_at"),
        }
    }

    async fn execute_for_video(
        &self,
        video_id: Uuid,
        query: sqlx::query::Query<'_, Postgres, PgArguments>,
    ) -> Result<()> {
        let result = query.execute(&self.pool).await.map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::VideoNotFound(video_id));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Video> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM video WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::VideoNotFound(id))?;
        Ok(Self::parse_video_row(&row))
    }

    async fn save_classification(&self, video_id: Uuid, write: ClassificationWrite) -> Result<()> {
        let suggestions = serde_json::to_value(&write.suggestions)?;
        self.execute_for_video(
            video_id,
            sqlx::query(
                "UPDATE video
                 SET ai_suggested_labels = $2,
                     ai_classified_at = $3,
                     rag_status = $4,
                     rag_status_updated_at = $3,
                     rag_status_updated_by = $5
                 WHERE id = $1",
            )
            .bind(video_id)
            .bind(suggestions)
            .bind(write.classified_at)
            .bind(write.rag_status.as_str())
            .bind(write.actor_id),
        )
        .await
    }

    async fn set_expiration(
        &self,
        video_id: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.execute_for_video(
            video_id,
            sqlx::query("UPDATE video SET expires_at = $2 WHERE id = $1")
                .bind(video_id)
                .bind(expires_at),
        )
        .await
    }

    async fn set_keep_permanently(&self, video_id: Uuid, keep: bool) -> Result<()> {
        self.execute_for_video(
            video_id,
            sqlx::query("UPDATE video SET keep_permanently = $2 WHERE id = $1")
                .bind(video_id)
                .bind(keep),
        )
        .await
    }

    async fn set_transcription_status(
        &self,
        video_id: Uuid,
        status: TranscriptionStatus,
    ) -> Result<()> {
        let current = self.get(video_id).await?.transcription_status;
        if !TranscriptionStatus::can_transition(current, status) {
            return Err(Error::InvalidInput(format!(
                "Cannot move transcription from {} to {}",
                current.map(|s| s.as_str()).unwrap_or("unset"),
                status
            )));
        }

        // Compare-and-set so a concurrent transition is not silently overwritten.
        let result = sqlx::query(
            "UPDATE video SET transcription_status = $2
             WHERE id = $1 AND transcription_status IS NOT DISTINCT FROM $3",
        )
        .bind(video_id)
        .bind(status.as_str())
        .bind(current.map(|s| s.as_str()))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::InvalidInput(format!(
                "Transcription status of {} changed concurrently",
                video_id
            )));
        }
        debug!(subsystem = "db", component = "videos", %video_id, status = %status, "Transcription status updated");
        Ok(())
    }

    async fn mark_transcription_failed(&self, video_id: Uuid) -> Result<()> {
        self.execute_for_video(
            video_id,
            sqlx::query("UPDATE video SET transcription_status = NULL WHERE id = $1")
                .bind(video_id),
        )
        .await
    }

    async fn list_space_names(&self, video_id: Uuid) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT s.name FROM space_video sv
             JOIN space s ON s.id = sv.space_id
             WHERE sv.video_id = $1
             ORDER BY s.name",
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_unclassified(&self, limit: i64) -> Result<Vec<Video>> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM video
             WHERE transcription_status = 'complete' AND ai_classified_at IS NULL
             ORDER BY created_at
             LIMIT $1"
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::parse_video_row).collect())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ExpiredVideo>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, expires_at FROM video
             WHERE expires_at IS NOT NULL
               AND expires_at <= $1
               AND keep_permanently = FALSE
             ORDER BY expires_at",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| ExpiredVideo {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
                expires_at: row.get("expires_at"),
            })
            .collect())
    }
}
