//! Label repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use vidcycle_core::{Error, Label, LabelRepository, NewLabel, Result};

const LABEL_COLUMNS: &str = "id, organization_id, name, display_name, description, color, icon, \
     category, retention_days, rag_default, is_system, is_active, created_at";

/// PostgreSQL implementation of LabelRepository.
#[derive(Clone)]
pub struct PgLabelRepository {
    pool: Pool<Postgres>,
}

impl PgLabelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub(crate) fn parse_label_row(row: &PgRow) -> Label {
        Label {
            id: row.get("id"),
            organization_id: row.get("organization_id"),
            name: row.get("name"),
            display_name: row.get("display_name"),
            description: row.get("description"),
            color: row.get("color"),
            icon: row.get("icon"),
            category: row
                .get::<String, _>("category")
                .parse()
                .unwrap_or_default(),
            retention_days: row.get("retention_days"),
            rag_default: row
                .get::<String, _>("rag_default")
                .parse()
                .unwrap_or_default(),
            is_system: row.get("is_system"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl LabelRepository for PgLabelRepository {
    async fn insert(&self, label: NewLabel) -> Result<Label> {
        let query = format!(
            "INSERT INTO label (id, organization_id, name, display_name, description, color, icon,
                                category, retention_days, rag_default, is_system, is_active,
                                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, $12, $12)
             RETURNING {LABEL_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(Uuid::now_v7())
            .bind(label.organization_id)
            .bind(&label.name)
            .bind(&label.display_name)
            .bind(&label.description)
            .bind(&label.color)
            .bind(&label.icon)
            .bind(label.category.as_str())
            .bind(label.retention_days)
            .bind(label.rag_default.as_str())
            .bind(label.is_system)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Error::DuplicateLabelName {
                        organization_id: label.organization_id,
                        name: label.name.clone(),
                    }
                } else {
                    err
                }
            })?;

        Ok(Self::parse_label_row(&row))
    }

    async fn insert_if_absent(&self, label: NewLabel) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO label (id, organization_id, name, display_name, description, color, icon,
                                category, retention_days, rag_default, is_system, is_active,
                                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, TRUE, $12, $12)
             ON CONFLICT (organization_id, name) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(label.organization_id)
        .bind(&label.name)
        .bind(&label.display_name)
        .bind(&label.description)
        .bind(&label.color)
        .bind(&label.icon)
        .bind(label.category.as_str())
        .bind(label.retention_days)
        .bind(label.rag_default.as_str())
        .bind(label.is_system)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> Result<Label> {
        let query = format!("SELECT {LABEL_COLUMNS} FROM label WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::LabelNotFound(id))?;
        Ok(Self::parse_label_row(&row))
    }

    async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Label>> {
        let query = format!(
            "SELECT {LABEL_COLUMNS} FROM label
             WHERE organization_id = $1 AND is_active
             ORDER BY category, display_name"
        );
        let rows = sqlx::query(&query)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::parse_label_row).collect())
    }

    async fn find_active_by_name(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Label>> {
        let query = format!(
            "SELECT {LABEL_COLUMNS} FROM label
             WHERE organization_id = $1 AND name = $2 AND is_active"
        );
        let row = sqlx::query(&query)
            .bind(organization_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(Self::parse_label_row))
    }

    async fn has_active_system_labels(&self, organization_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM label
                            WHERE organization_id = $1 AND is_system AND is_active)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn system_label_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM label WHERE name = $1 AND is_system)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn list_system_label_names(&self) -> Result<Vec<String>> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT name FROM label WHERE is_system ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(names)
    }

    async fn organizations_with_system_labels(&self) -> Result<Vec<Uuid>> {
        let orgs: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT organization_id FROM label WHERE is_system ORDER BY organization_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(orgs)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<()> {
        let result =
            sqlx::query("UPDATE label SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::LabelNotFound(id));
        }
        Ok(())
    }
}
