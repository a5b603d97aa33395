//! Video ↔ label assignment repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use vidcycle_core::{AssignedLabel, AssignmentRepository, Error, NewAssignment, Result};

use crate::labels::PgLabelRepository;

/// PostgreSQL implementation of AssignmentRepository.
#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: Pool<Postgres>,
}

impl PgAssignmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<AssignedLabel>> {
        let rows = sqlx::query(
            r#"
            SELECT
                l.id, l.organization_id, l.name, l.display_name, l.description, l.color, l.icon,
                l.category, l.retention_days, l.rag_default, l.is_system, l.is_active, l.created_at,
                vl.assigned_by, vl.assigned_at, vl.is_ai_suggested, vl.ai_confidence
            FROM video_label vl
            JOIN label l ON l.id = vl.label_id
            WHERE vl.video_id = $1
            ORDER BY l.category, l.display_name
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let assigned = rows
            .iter()
            .map(|row| AssignedLabel {
                label: PgLabelRepository::parse_label_row(row),
                assigned_by: row.get("assigned_by"),
                assigned_at: row.get("assigned_at"),
                is_ai_suggested: row.get("is_ai_suggested"),
                ai_confidence: row.get("ai_confidence"),
            })
            .collect();

        Ok(assigned)
    }

    async fn insert_if_absent(&self, assignment: NewAssignment) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO video_label (video_id, label_id, assigned_by, assigned_at, is_ai_suggested, ai_confidence)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (video_id, label_id) DO NOTHING",
        )
        .bind(assignment.video_id)
        .bind(assignment.label_id)
        .bind(assignment.assigned_by)
        .bind(Utc::now())
        .bind(assignment.is_ai_suggested)
        .bind(assignment.ai_confidence)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, video_id: Uuid, label_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM video_label WHERE video_id = $1 AND label_id = $2")
            .bind(video_id)
            .bind(label_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
