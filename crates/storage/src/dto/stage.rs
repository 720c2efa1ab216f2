use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Stage;

/// Request payload for flipping a stage's neutralized/cancelled flags
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStageStatusRequest {
    pub is_neutralized: Option<bool>,
    pub is_cancelled: Option<bool>,
}

impl UpdateStageStatusRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.is_neutralized.is_none() && self.is_cancelled.is_none() {
            return Err("At least one of isNeutralized or isCancelled must be provided".to_string());
        }
        Ok(())
    }
}

/// Stage with its scoring status resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageResponse {
    pub stage_id: Uuid,
    pub stage_number: i32,
    pub name: String,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub distance_km: Option<i32>,
    pub stage_date: Option<NaiveDate>,
    pub is_neutralized: bool,
    pub is_cancelled: bool,
    pub is_final: bool,
}

impl StageResponse {
    pub fn from_stage(stage: Stage, max_stage_number: Option<i32>) -> Self {
        Self {
            is_final: crate::services::stage_status::is_final(stage.stage_number, max_stage_number),
            stage_id: stage.stage_id,
            stage_number: stage.stage_number,
            name: stage.name,
            start_location: stage.start_location,
            end_location: stage.end_location,
            distance_km: stage.distance_km,
            stage_date: stage.stage_date,
            is_neutralized: stage.is_neutralized,
            is_cancelled: stage.is_cancelled,
        }
    }
}
