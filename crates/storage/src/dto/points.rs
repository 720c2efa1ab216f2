use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Outcome of a points or standings computation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSummary {
    pub participants_calculated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalPointsSummary {
    pub final_classification: CalculationSummary,
    pub final_jerseys: CalculationSummary,
}

/// A participant's points for one stage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StagePointsEntry {
    pub participant_id: Uuid,
    pub team_name: String,
    pub points_stage: i32,
    pub points_jerseys: i32,
    pub points_bonus: i32,
    pub total_points: i32,
}
