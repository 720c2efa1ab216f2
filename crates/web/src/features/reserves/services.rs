use sqlx::PgPool;
use storage::{
    dto::reserves::{
        ActivateReservesRequest, ActivateReservesResponse, ActivateTeamReservesRequest,
        StageActivationReport, TeamActivationResponse,
    },
    error::Result,
    services::reserve_activation,
};
use uuid::Uuid;

pub async fn activate_reserves_for_stage(
    pool: &PgPool,
    stage_id: Uuid,
) -> Result<StageActivationReport> {
    reserve_activation::activate_reserves_for_stage(pool, stage_id).await
}

pub async fn activate_reserves_for_team(
    pool: &PgPool,
    fantasy_team_id: Uuid,
    request: &ActivateTeamReservesRequest,
) -> Result<TeamActivationResponse> {
    let activated_count = reserve_activation::activate_reserves_for_team(
        pool,
        fantasy_team_id,
        request.needed_count.max(0) as usize,
        request.current_active_main_count,
    )
    .await?;

    Ok(TeamActivationResponse {
        fantasy_team_id,
        activated_count,
    })
}

/// Top up one participant's team, or every team when `activate_all` is set
pub async fn activate_reserves(
    pool: &PgPool,
    request: &ActivateReservesRequest,
) -> Result<ActivateReservesResponse> {
    match request.participant_id {
        Some(participant_id) if !request.activate_all => {
            let report =
                reserve_activation::activate_reserves_for_participant(pool, participant_id).await?;
            Ok(ActivateReservesResponse {
                total_reserves_activated: report.reserves_activated,
                teams: vec![report],
            })
        }
        _ => reserve_activation::activate_reserves_for_all_teams(pool).await,
    }
}
