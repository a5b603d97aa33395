//! Permanent removal of a video's database rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use vidcycle_core::{CleanupRepository, DeletionStep, Error, Result, StepOutcome};

/// PostgreSQL implementation of CleanupRepository.
#[derive(Clone)]
pub struct PgCleanupRepository {
    pool: Pool<Postgres>,
}

impl PgCleanupRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CleanupRepository for PgCleanupRepository {
    async fn delete_video_rows(
        &self,
        video_id: Uuid,
        now: DateTime<Utc>,
        steps: &[DeletionStep],
    ) -> Result<Option<Vec<StepOutcome>>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Row lock holds off keep/expiration updates until commit.
        let locked: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM video
             WHERE id = $1
               AND expires_at IS NOT NULL
               AND expires_at <= $2
               AND keep_permanently = FALSE
             FOR UPDATE",
        )
        .bind(video_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if locked.is_none() {
            tx.rollback().await.map_err(Error::Database)?;
            debug!(
                subsystem = "db",
                component = "cleanup",
                %video_id,
                "Video no longer eligible for deletion"
            );
            return Ok(None);
        }

        let mut outcomes = Vec::with_capacity(steps.len());

        for step in steps {
            // Table and column names come from a closed enum, never from input.
            let query = format!(
                "DELETE FROM {} WHERE {} = $1",
                step.table(),
                step.key_column()
            );
            let result = sqlx::query(&query)
                .bind(video_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

            debug!(
                subsystem = "db",
                component = "cleanup",
                %video_id,
                step = step.as_str(),
                rows = result.rows_affected(),
                "Deletion step complete"
            );
            outcomes.push(StepOutcome {
                step: *step,
                rows: result.rows_affected(),
            });
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(Some(outcomes))
    }
}
