use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::points::StagePointsEntry;
use crate::dto::common::PaginationParams;
use crate::dto::standings::StandingsEntry;
use crate::error::Result;
use crate::services::stage_points::PointsBreakdown;

/// A participant's summed points over a range of stages
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ParticipantTotal {
    pub participant_id: Uuid,
    pub team_name: String,
    pub total_points: i64,
}

/// Repository for stage points and cumulative standings
pub struct PointsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PointsRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Overwrite a participant's points for a stage
    pub async fn upsert_stage_points(
        conn: &mut PgConnection,
        stage_id: Uuid,
        participant_id: Uuid,
        points: PointsBreakdown,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fantasy_stage_points
                (stage_id, participant_id, points_stage, points_jerseys, points_bonus)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stage_id, participant_id)
            DO UPDATE SET
                points_stage = EXCLUDED.points_stage,
                points_jerseys = EXCLUDED.points_jerseys,
                points_bonus = EXCLUDED.points_bonus,
                calculated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(stage_id)
        .bind(participant_id)
        .bind(points.points_stage)
        .bind(points.points_jerseys)
        .bind(points.points_bonus)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Add to a participant's bonus points for a stage, creating the row if missing
    pub async fn add_bonus_points(
        conn: &mut PgConnection,
        stage_id: Uuid,
        participant_id: Uuid,
        bonus: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fantasy_stage_points
                (stage_id, participant_id, points_stage, points_jerseys, points_bonus)
            VALUES ($1, $2, 0, 0, $3)
            ON CONFLICT (stage_id, participant_id)
            DO UPDATE SET
                points_bonus = fantasy_stage_points.points_bonus + EXCLUDED.points_bonus,
                calculated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(stage_id)
        .bind(participant_id)
        .bind(bonus)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Every participant's total over stages up to and including `stage_number`.
    /// Participants without rows are included with a zero total.
    pub async fn totals_through_stage(&self, stage_number: i32) -> Result<Vec<ParticipantTotal>> {
        let totals = sqlx::query_as::<_, ParticipantTotal>(
            r#"
            SELECT
                p.participant_id,
                p.team_name,
                COALESCE(SUM(fsp.points_stage + fsp.points_jerseys + fsp.points_bonus), 0)::BIGINT
                    AS total_points
            FROM participants p
            LEFT JOIN fantasy_stage_points fsp ON fsp.participant_id = p.participant_id
                AND fsp.stage_id IN (SELECT stage_id FROM stages WHERE stage_number <= $1)
            GROUP BY p.participant_id, p.team_name
            "#,
        )
        .bind(stage_number)
        .fetch_all(self.pool)
        .await?;

        Ok(totals)
    }

    pub async fn upsert_cumulative_points(
        conn: &mut PgConnection,
        participant_id: Uuid,
        after_stage_id: Uuid,
        total_points: i32,
        rank: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO fantasy_cumulative_points (participant_id, after_stage_id, total_points, rank)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (participant_id, after_stage_id)
            DO UPDATE SET
                total_points = EXCLUDED.total_points,
                rank = EXCLUDED.rank,
                calculated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(participant_id)
        .bind(after_stage_id)
        .bind(total_points)
        .bind(rank)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn list_stage_points(&self, stage_id: Uuid) -> Result<Vec<StagePointsEntry>> {
        let rows = sqlx::query_as::<_, StagePointsRow>(
            r#"
            SELECT p.participant_id, p.team_name,
                   fsp.points_stage, fsp.points_jerseys, fsp.points_bonus, fsp.total_points
            FROM fantasy_stage_points fsp
            INNER JOIN participants p ON p.participant_id = fsp.participant_id
            WHERE fsp.stage_id = $1
            ORDER BY fsp.total_points DESC, p.team_name ASC
            "#,
        )
        .bind(stage_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(StagePointsEntry::from).collect())
    }

    /// Paginated standings after a stage, plus the total number of ranked participants
    pub async fn list_standings(
        &self,
        stage_id: Uuid,
        pagination: &PaginationParams,
    ) -> Result<(Vec<StandingsEntry>, i64)> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM fantasy_cumulative_points WHERE after_stage_id = $1",
        )
        .bind(stage_id)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, StandingsRow>(
            r#"
            SELECT fcp.rank, p.participant_id, p.team_name, fcp.total_points,
                   COALESCE(fsp.total_points, 0) AS stage_points
            FROM fantasy_cumulative_points fcp
            INNER JOIN participants p ON p.participant_id = fcp.participant_id
            LEFT JOIN fantasy_stage_points fsp
                ON fsp.participant_id = fcp.participant_id AND fsp.stage_id = fcp.after_stage_id
            WHERE fcp.after_stage_id = $1
            ORDER BY fcp.rank ASC, p.team_name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(stage_id)
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| StandingsEntry {
                rank: row.rank,
                participant_id: row.participant_id,
                team_name: row.team_name,
                total_points: row.total_points,
                stage_points: row.stage_points,
            })
            .collect();

        Ok((entries, total_items))
    }
}

#[derive(FromRow)]
struct StagePointsRow {
    participant_id: Uuid,
    team_name: String,
    points_stage: i32,
    points_jerseys: i32,
    points_bonus: i32,
    total_points: i32,
}

impl From<StagePointsRow> for StagePointsEntry {
    fn from(row: StagePointsRow) -> Self {
        Self {
            participant_id: row.participant_id,
            team_name: row.team_name,
            points_stage: row.points_stage,
            points_jerseys: row.points_jerseys,
            points_bonus: row.points_bonus,
            total_points: row.total_points,
        }
    }
}

#[derive(FromRow)]
struct StandingsRow {
    rank: i32,
    participant_id: Uuid,
    team_name: String,
    total_points: i32,
    stage_points: i32,
}
