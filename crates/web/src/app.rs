use axum::Router;
use storage::Database;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features;
use crate::middleware::auth::ApiKeys;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::stages::handlers::list_stages,
        features::stages::handlers::import_stage_results,
        features::stages::handlers::recalculate_stage,
        features::stages::handlers::update_stage_status,
        features::stages::handlers::get_stage_points,
        features::points::handlers::calculate_stage_points,
        features::points::handlers::calculate_cumulative_points,
        features::points::handlers::calculate_final_points,
        features::standings::handlers::get_standings,
        features::reserves::handlers::activate_reserves_for_stage,
        features::reserves::handlers::activate_reserves_for_team,
        features::reserves::handlers::activate_reserves,
    ),
    components(
        schemas(
            storage::dto::results::ImportStageResultsRequest,
            storage::dto::results::StageResultInput,
            storage::dto::results::JerseyAssignmentInput,
            storage::dto::stage::UpdateStageStatusRequest,
            storage::dto::stage::StageResponse,
            storage::dto::points::CalculationSummary,
            storage::dto::points::FinalPointsSummary,
            storage::dto::points::StagePointsEntry,
            storage::dto::standings::StandingsEntry,
            storage::dto::common::PaginationMeta,
            storage::dto::reserves::ActivateTeamReservesRequest,
            storage::dto::reserves::ActivateReservesRequest,
            storage::dto::reserves::TeamActivationResponse,
            storage::dto::reserves::ActivateReservesResponse,
            storage::dto::reserves::TeamFillReport,
            storage::dto::reserves::StageActivationReport,
            storage::dto::reserves::TeamActivationFailure,
            storage::services::ingestion::ImportReport,
            storage::services::ingestion::PipelineStage,
            storage::models::JerseyType,
        )
    ),
    tags(
        (name = "stages", description = "Stage results import and status"),
        (name = "points", description = "Points and standings calculation"),
        (name = "standings", description = "Public standings"),
        (name = "reserves", description = "Reserve rider activation"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

pub fn router(db: Database, api_keys: ApiKeys) -> Router {
    let api = Router::new()
        .nest("/stages", features::stages::routes::routes(api_keys.clone()))
        .nest("/points", features::points::routes::routes(api_keys.clone()))
        .nest("/standings", features::standings::routes::routes())
        .nest("/reserves", features::reserves::routes::routes(api_keys));

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}
