use sqlx::PgPool;
use storage::{
    dto::{
        points::StagePointsEntry,
        results::ImportStageResultsRequest,
        stage::{StageResponse, UpdateStageStatusRequest},
    },
    error::Result,
    repository::{points::PointsRepository, stage::StageRepository},
    services::ingestion::{self, ImportReport},
};
use uuid::Uuid;

/// List all stages with their resolved status
pub async fn list_stages(pool: &PgPool) -> Result<Vec<StageResponse>> {
    let repo = StageRepository::new(pool);
    let max_stage_number = repo.max_stage_number().await?;
    let stages = repo.list().await?;

    Ok(stages
        .into_iter()
        .map(|stage| StageResponse::from_stage(stage, max_stage_number))
        .collect())
}

/// Import results and run the scoring pipeline
pub async fn import_stage_results(
    pool: &PgPool,
    stage_id: Uuid,
    request: &ImportStageResultsRequest,
) -> Result<ImportReport> {
    ingestion::import_stage_results(pool, stage_id, request).await
}

/// Rerun the scoring pipeline from stored results
pub async fn recalculate_stage(pool: &PgPool, stage_id: Uuid) -> Result<ImportReport> {
    ingestion::recalculate_stage(pool, stage_id).await
}

/// Update the neutralized/cancelled flags of a stage
pub async fn update_stage_status(
    pool: &PgPool,
    stage_id: Uuid,
    request: &UpdateStageStatusRequest,
) -> Result<StageResponse> {
    let repo = StageRepository::new(pool);
    let stage = repo
        .update_status(stage_id, request.is_neutralized, request.is_cancelled)
        .await?;
    let max_stage_number = repo.max_stage_number().await?;

    tracing::info!(
        stage_number = stage.stage_number,
        is_neutralized = stage.is_neutralized,
        is_cancelled = stage.is_cancelled,
        "Stage status updated"
    );

    Ok(StageResponse::from_stage(stage, max_stage_number))
}

/// Points per participant for a stage
pub async fn get_stage_points(pool: &PgPool, stage_id: Uuid) -> Result<Vec<StagePointsEntry>> {
    StageRepository::new(pool).find_by_id(stage_id).await?;

    let repo = PointsRepository::new(pool);
    repo.list_stage_points(stage_id).await
}
