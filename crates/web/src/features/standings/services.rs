use sqlx::PgPool;
use storage::{
    dto::{common::PaginationParams, standings::StandingsEntry},
    error::Result,
    repository::{points::PointsRepository, stage::StageRepository},
};
use uuid::Uuid;

/// Standings as of a stage, paginated
pub async fn get_standings(
    pool: &PgPool,
    stage_id: Uuid,
    pagination: &PaginationParams,
) -> Result<(Vec<StandingsEntry>, i64)> {
    StageRepository::new(pool).find_by_id(stage_id).await?;

    let repo = PointsRepository::new(pool);
    repo.list_standings(stage_id, pagination).await
}
