use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use storage::Database;

use super::handlers::{
    get_stage_points, import_stage_results, list_stages, recalculate_stage, update_stage_status,
};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    let protected = Router::new()
        .route("/:stage_id/results", post(import_stage_results))
        .route("/:stage_id/recalculate", post(recalculate_stage))
        .route("/:stage_id/status", put(update_stage_status))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", get(list_stages))
        .route("/:stage_id/points", get(get_stage_points))
        .merge(protected)
}
