use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{EligibleRider, FantasyTeam, RosterSlot, SlotType};

/// Repository for fantasy teams and their roster slots
pub struct RosterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RosterRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_teams(&self) -> Result<Vec<FantasyTeam>> {
        let teams = sqlx::query_as::<_, FantasyTeam>(
            r#"
            SELECT fantasy_team_id, participant_id, created_at
            FROM fantasy_teams
            ORDER BY created_at
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(teams)
    }

    pub async fn find_team(&self, fantasy_team_id: Uuid) -> Result<FantasyTeam> {
        let team = sqlx::query_as::<_, FantasyTeam>(
            r#"
            SELECT fantasy_team_id, participant_id, created_at
            FROM fantasy_teams
            WHERE fantasy_team_id = $1
            "#,
        )
        .bind(fantasy_team_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(team)
    }

    pub async fn find_team_by_participant(&self, participant_id: Uuid) -> Result<FantasyTeam> {
        let team = sqlx::query_as::<_, FantasyTeam>(
            r#"
            SELECT fantasy_team_id, participant_id, created_at
            FROM fantasy_teams
            WHERE participant_id = $1
            "#,
        )
        .bind(participant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(team)
    }

    /// Active slots of one type for a team, ordered by slot number
    pub async fn active_slots(
        &self,
        fantasy_team_id: Uuid,
        slot_type: SlotType,
    ) -> Result<Vec<RosterSlot>> {
        let slots = sqlx::query_as::<_, RosterSlot>(
            r#"
            SELECT slot_id, fantasy_team_id, rider_id, slot_type, slot_number, active
            FROM fantasy_team_riders
            WHERE fantasy_team_id = $1 AND slot_type = $2 AND active = true
            ORDER BY slot_number ASC
            "#,
        )
        .bind(fantasy_team_id)
        .bind(slot_type.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(slots)
    }

    /// Every rider that can score: main slot, active, with its owning participant
    pub async fn eligible_riders(&self) -> Result<Vec<EligibleRider>> {
        let riders = sqlx::query_as::<_, EligibleRider>(
            r#"
            SELECT ft.participant_id, ftr.rider_id
            FROM fantasy_teams ft
            JOIN fantasy_team_riders ftr ON ft.fantasy_team_id = ftr.fantasy_team_id
            WHERE ftr.slot_type = 'main' AND ftr.active = true
            ORDER BY ft.participant_id, ftr.slot_number
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(riders)
    }

    /// Defer the active slot constraint to commit time for the current transaction
    pub async fn defer_slot_constraint(conn: &mut PgConnection) -> Result<()> {
        sqlx::query("SET CONSTRAINTS fantasy_team_riders_active_slot_excl DEFERRED")
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn deactivate_slot(conn: &mut PgConnection, slot_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE fantasy_team_riders SET active = false WHERE slot_id = $1")
            .bind(slot_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Whether an active main slot other than `slot_id` already holds `slot_number`
    pub async fn main_slot_taken(
        conn: &mut PgConnection,
        fantasy_team_id: Uuid,
        slot_number: i32,
        slot_id: Uuid,
    ) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM fantasy_team_riders
                WHERE fantasy_team_id = $1
                  AND slot_type = 'main'
                  AND active = true
                  AND slot_number = $2
                  AND slot_id <> $3
            )
            "#,
        )
        .bind(fantasy_team_id)
        .bind(slot_number)
        .bind(slot_id)
        .fetch_one(conn)
        .await?;

        Ok(taken)
    }

    /// Move a reserve slot into a main slot number and activate it
    pub async fn promote_to_main(
        conn: &mut PgConnection,
        slot_id: Uuid,
        slot_number: i32,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE fantasy_team_riders
            SET slot_type = 'main', slot_number = $2, active = true
            WHERE slot_id = $1 AND slot_type = 'reserve'
            "#,
        )
        .bind(slot_id)
        .bind(slot_number)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
