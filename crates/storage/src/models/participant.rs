use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// The roster owned by a participant; one per participant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FantasyTeam {
    pub fantasy_team_id: Uuid,
    pub participant_id: Uuid,
    pub created_at: NaiveDateTime,
}
