use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{JerseyType, JerseyWearer, StageResult};

/// A result row ready to be written, with its same-time group resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStageResult {
    pub rider_id: Uuid,
    pub position: Option<i32>,
    pub time_seconds: Option<i32>,
    pub same_time_group: Option<i32>,
}

/// Repository for stage results, jersey wearers and the rider lookups they need
pub struct ResultsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResultsRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_stage(&self, stage_id: Uuid) -> Result<Vec<StageResult>> {
        let results = sqlx::query_as::<_, StageResult>(
            r#"
            SELECT stage_result_id, stage_id, rider_id, position, time_seconds, same_time_group
            FROM stage_results
            WHERE stage_id = $1
            ORDER BY position NULLS LAST
            "#,
        )
        .bind(stage_id)
        .fetch_all(self.pool)
        .await?;

        Ok(results)
    }

    pub async fn count_for_stage(&self, stage_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stage_results WHERE stage_id = $1")
                .bind(stage_id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    pub async fn jersey_wearers_for_stage(&self, stage_id: Uuid) -> Result<Vec<JerseyWearer>> {
        let wearers = sqlx::query_as::<_, JerseyWearer>(
            r#"
            SELECT stage_id, jersey_type, rider_id
            FROM stage_jersey_wearers
            WHERE stage_id = $1
            "#,
        )
        .bind(stage_id)
        .fetch_all(self.pool)
        .await?;

        Ok(wearers)
    }

    /// Of the given rider ids, those that do not exist in the riders table
    pub async fn unknown_riders(&self, rider_ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let unknown = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT candidate.rider_id
            FROM UNNEST($1::uuid[]) AS candidate(rider_id)
            LEFT JOIN riders r ON r.rider_id = candidate.rider_id
            WHERE r.rider_id IS NULL
            "#,
        )
        .bind(rider_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(unknown)
    }

    /// Delete and reinsert all result rows of a stage. Run inside a transaction.
    pub async fn replace_results(
        conn: &mut PgConnection,
        stage_id: Uuid,
        results: &[NewStageResult],
    ) -> Result<u64> {
        sqlx::query("DELETE FROM stage_results WHERE stage_id = $1")
            .bind(stage_id)
            .execute(&mut *conn)
            .await?;

        let mut inserted = 0;
        for result in results {
            inserted += sqlx::query(
                r#"
                INSERT INTO stage_results (stage_id, rider_id, position, time_seconds, same_time_group)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(stage_id)
            .bind(result.rider_id)
            .bind(result.position)
            .bind(result.time_seconds)
            .bind(result.same_time_group)
            .execute(&mut *conn)
            .await?
            .rows_affected();
        }

        Ok(inserted)
    }

    /// Delete and reinsert the jersey wearers of a stage. Run inside a transaction.
    pub async fn replace_jersey_wearers(
        conn: &mut PgConnection,
        stage_id: Uuid,
        wearers: &[(JerseyType, Uuid)],
    ) -> Result<()> {
        sqlx::query("DELETE FROM stage_jersey_wearers WHERE stage_id = $1")
            .bind(stage_id)
            .execute(&mut *conn)
            .await?;

        for (jersey_type, rider_id) in wearers {
            sqlx::query(
                r#"
                INSERT INTO stage_jersey_wearers (stage_id, jersey_type, rider_id)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(stage_id)
            .bind(jersey_type.as_str())
            .bind(rider_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
