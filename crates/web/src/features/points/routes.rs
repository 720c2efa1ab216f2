use axum::{Router, middleware, routing::post};
use storage::Database;

use super::handlers::{calculate_cumulative_points, calculate_final_points, calculate_stage_points};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    Router::new()
        .route("/stages/:stage_id", post(calculate_stage_points))
        .route("/stages/:stage_id/cumulative", post(calculate_cumulative_points))
        .route("/stages/:stage_id/final", post(calculate_final_points))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
