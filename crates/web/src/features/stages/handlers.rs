use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        points::StagePointsEntry,
        results::ImportStageResultsRequest,
        stage::{StageResponse, UpdateStageStatusRequest},
    },
    services::ingestion::ImportReport,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/stages",
    responses(
        (status = 200, description = "All stages in race order", body = Vec<StageResponse>)
    ),
    tag = "stages"
)]
pub async fn list_stages(State(db): State<Database>) -> Result<Response, WebError> {
    let stages = services::list_stages(db.pool()).await?;

    Ok(Json(stages).into_response())
}

#[utoipa::path(
    post,
    path = "/api/stages/{stage_id}/results",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    request_body = ImportStageResultsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Results imported, scoring pipeline report", body = ImportReport),
        (status = 400, description = "Invalid results payload or unknown riders"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "stages"
)]
pub async fn import_stage_results(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
    Json(payload): Json<ImportStageResultsRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let report = services::import_stage_results(db.pool(), stage_id, &payload).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/stages/{stage_id}/recalculate",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Points, standings and final bonuses recalculated", body = ImportReport),
        (status = 400, description = "Stage has no results"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "stages"
)]
pub async fn recalculate_stage(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let report = services::recalculate_stage(db.pool(), stage_id).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    put,
    path = "/api/stages/{stage_id}/status",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    request_body = UpdateStageStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Stage status updated", body = StageResponse),
        (status = 400, description = "No flag provided"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "stages"
)]
pub async fn update_stage_status(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
    Json(payload): Json<UpdateStageStatusRequest>,
) -> Result<Response, WebError> {
    payload.validate().map_err(WebError::BadRequest)?;

    let stage = services::update_stage_status(db.pool(), stage_id, &payload).await?;

    Ok(Json(stage).into_response())
}

#[utoipa::path(
    get,
    path = "/api/stages/{stage_id}/points",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    responses(
        (status = 200, description = "Points per participant for the stage", body = Vec<StagePointsEntry>),
        (status = 404, description = "Stage not found")
    ),
    tag = "stages"
)]
pub async fn get_stage_points(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let points = services::get_stage_points(db.pool(), stage_id).await?;

    Ok(Json(points).into_response())
}
