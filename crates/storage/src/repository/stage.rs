use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Stage;

const STAGE_COLUMNS: &str = r#"
    stage_id, stage_number, name, start_location, end_location, distance_km,
    stage_date, is_neutralized, is_cancelled, created_at
"#;

/// Repository for Stage database operations
pub struct StageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StageRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all stages in race order
    pub async fn list(&self) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages ORDER BY stage_number"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(stages)
    }

    pub async fn find_optional(&self, stage_id: Uuid) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE stage_id = $1"
        ))
        .bind(stage_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(stage)
    }

    pub async fn find_by_id(&self, stage_id: Uuid) -> Result<Stage> {
        self.find_optional(stage_id)
            .await?
            .ok_or(StorageError::NotFound)
    }

    pub async fn find_by_number(&self, stage_number: i32) -> Result<Stage> {
        sqlx::query_as::<_, Stage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM stages WHERE stage_number = $1"
        ))
        .bind(stage_number)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }

    /// Highest stage number across all stages, `None` when no stage exists
    pub async fn max_stage_number(&self) -> Result<Option<i32>> {
        let max = sqlx::query_scalar::<_, Option<i32>>("SELECT MAX(stage_number) FROM stages")
            .fetch_one(self.pool)
            .await?;

        Ok(max)
    }

    /// Latest stage (by stage number) that has results recorded
    pub async fn latest_with_results(&self) -> Result<Option<Stage>> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            r#"
            SELECT {STAGE_COLUMNS}
            FROM stages
            WHERE stage_id IN (SELECT DISTINCT stage_id FROM stage_results)
            ORDER BY stage_number DESC
            LIMIT 1
            "#
        ))
        .fetch_optional(self.pool)
        .await?;

        Ok(stage)
    }

    /// Update the override flags. `None` leaves a flag unchanged.
    pub async fn update_status(
        &self,
        stage_id: Uuid,
        is_neutralized: Option<bool>,
        is_cancelled: Option<bool>,
    ) -> Result<Stage> {
        let stage = sqlx::query_as::<_, Stage>(&format!(
            r#"
            UPDATE stages
            SET
                is_neutralized = COALESCE($2, is_neutralized),
                is_cancelled = COALESCE($3, is_cancelled)
            WHERE stage_id = $1
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(stage_id)
        .bind(is_neutralized)
        .bind(is_cancelled)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(stage)
    }
}
