use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use storage::{
    Database,
    dto::{
        common::{PaginatedResponse, PaginationParams},
        standings::StandingsEntry,
    },
};
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/standings/{stage_id}",
    params(
        ("stage_id" = Uuid, Path, description = "Stage ID"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Standings after the stage", body = PaginatedResponse<StandingsEntry>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Stage not found")
    ),
    tag = "standings"
)]
pub async fn get_standings(
    State(db): State<Database>,
    Path(stage_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let (entries, total_items) = services::get_standings(db.pool(), stage_id, &pagination).await?;

    let response = PaginatedResponse::new(
        entries,
        pagination.page,
        pagination.page_size,
        total_items,
    );

    Ok(Json(response).into_response())
}
