use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::reserves::{
        ActivateReservesRequest, ActivateReservesResponse, ActivateTeamReservesRequest,
        StageActivationReport, TeamActivationResponse,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/reserves/stages/{stage_id}",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Missing main riders replaced by reserves", body = StageActivationReport),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Stage not found")
    ),
    tag = "reserves"
)]
pub async fn activate_reserves_for_stage(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let report = services::activate_reserves_for_stage(db.pool(), stage_id).await?;

    Ok(Json(report).into_response())
}

#[utoipa::path(
    post,
    path = "/api/reserves/teams/{team_id}",
    params(
        ("team_id" = Uuid, Path, description = "Fantasy team ID")
    ),
    request_body = ActivateTeamReservesRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Vacant main slots filled", body = TeamActivationResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Team not found"),
        (status = 409, description = "Roster slot conflict")
    ),
    tag = "reserves"
)]
pub async fn activate_reserves_for_team(
    State(db): State<Database>,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<ActivateTeamReservesRequest>,
) -> Result<Response, WebError> {
    payload.validate()?;

    let response = services::activate_reserves_for_team(db.pool(), team_id, &payload).await?;

    Ok(Json(response).into_response())
}

#[utoipa::path(
    post,
    path = "/api/reserves/activate",
    request_body = ActivateReservesRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Teams topped up to a full set of main riders", body = ActivateReservesResponse),
        (status = 400, description = "participantId or activateAll required"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No team for this participant")
    ),
    tag = "reserves"
)]
pub async fn activate_reserves(
    State(db): State<Database>,
    Json(payload): Json<ActivateReservesRequest>,
) -> Result<Response, WebError> {
    payload.validate().map_err(WebError::BadRequest)?;

    let response = services::activate_reserves(db.pool(), &payload).await?;

    Ok(Json(response).into_response())
}
