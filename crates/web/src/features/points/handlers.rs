use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::points::{CalculationSummary, FinalPointsSummary},
};
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/points/stages/{stage_id}",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stage points calculated", body = CalculationSummary),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found"),
        (status = 500, description = "Scoring rules missing")
    ),
    tag = "points"
)]
pub async fn calculate_stage_points(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let summary = services::calculate_stage_points(db.pool(), stage_id).await?;

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    post,
    path = "/api/points/stages/{stage_id}/cumulative",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Standings calculated as of the stage", body = CalculationSummary),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "points"
)]
pub async fn calculate_cumulative_points(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let summary = services::calculate_cumulative_points(db.pool(), stage_id).await?;

    Ok(Json(summary).into_response())
}

#[utoipa::path(
    post,
    path = "/api/points/stages/{stage_id}/final",
    params(
        ("stage_id" = Uuid, Path, description = "Final stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Final classification and jersey bonuses added", body = FinalPointsSummary),
        (status = 400, description = "Stage is not the final stage"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "points"
)]
pub async fn calculate_final_points(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let summary = services::calculate_final_points(db.pool(), stage_id).await?;

    Ok(Json(summary).into_response())
}
