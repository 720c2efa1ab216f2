use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct StandingsEntry {
    pub rank: i32,
    pub participant_id: Uuid,
    pub team_name: String,
    pub total_points: i32,
    /// Points earned in the stage the standings are computed for
    pub stage_points: i32,
}
