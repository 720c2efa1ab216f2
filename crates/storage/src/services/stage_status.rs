use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Stage;
use crate::repository::stage::StageRepository;

/// Scoring overrides that apply to a stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageStatus {
    pub is_neutralized: bool,
    pub is_cancelled: bool,
    pub is_final: bool,
}

impl StageStatus {
    pub fn from_stage(stage: &Stage, max_stage_number: Option<i32>) -> Self {
        Self {
            is_neutralized: stage.is_neutralized,
            is_cancelled: stage.is_cancelled,
            is_final: is_final(stage.stage_number, max_stage_number),
        }
    }

    /// Position points count unless the stage was neutralized or cancelled
    pub fn counts_position_points(&self) -> bool {
        !self.is_neutralized && !self.is_cancelled
    }

    /// Regular jersey points never count on the final stage; final jerseys
    /// are scored separately there.
    pub fn counts_jersey_points(&self) -> bool {
        !self.is_final && !self.is_cancelled
    }

    /// End-of-tour bonuses are only awarded on a final stage that was raced
    pub fn counts_final_bonuses(&self) -> bool {
        self.is_final && !self.is_cancelled
    }
}

pub fn is_final(stage_number: i32, max_stage_number: Option<i32>) -> bool {
    max_stage_number == Some(stage_number)
}

/// Whether `stage_id` is the last stage of the tour. Unknown stages are not final.
pub async fn is_final_stage(pool: &PgPool, stage_id: Uuid) -> Result<bool> {
    Ok(resolve(pool, stage_id).await?.is_final)
}

pub async fn is_neutralized(pool: &PgPool, stage_id: Uuid) -> Result<bool> {
    Ok(resolve(pool, stage_id).await?.is_neutralized)
}

pub async fn is_cancelled(pool: &PgPool, stage_id: Uuid) -> Result<bool> {
    Ok(resolve(pool, stage_id).await?.is_cancelled)
}

/// Resolve all flags at once. An absent stage resolves to all-false.
pub async fn resolve(pool: &PgPool, stage_id: Uuid) -> Result<StageStatus> {
    let repo = StageRepository::new(pool);
    let Some(stage) = repo.find_optional(stage_id).await? else {
        return Ok(StageStatus::default());
    };
    let max_stage_number = repo.max_stage_number().await?;

    Ok(StageStatus::from_stage(&stage, max_stage_number))
}
