use sqlx::PgPool;
use storage::{
    dto::points::{CalculationSummary, FinalPointsSummary},
    error::Result,
    services::{final_classification, stage_points, standings},
};
use uuid::Uuid;

pub async fn calculate_stage_points(pool: &PgPool, stage_id: Uuid) -> Result<CalculationSummary> {
    stage_points::calculate_stage_points(pool, stage_id).await
}

pub async fn calculate_cumulative_points(
    pool: &PgPool,
    stage_id: Uuid,
) -> Result<CalculationSummary> {
    standings::calculate_cumulative_points(pool, stage_id).await
}

pub async fn calculate_final_points(pool: &PgPool, stage_id: Uuid) -> Result<FinalPointsSummary> {
    final_classification::rescore_final_stage(pool, stage_id).await
}
