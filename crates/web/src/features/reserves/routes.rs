use axum::{Router, middleware, routing::post};
use storage::Database;

use super::handlers::{activate_reserves, activate_reserves_for_stage, activate_reserves_for_team};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Database> {
    Router::new()
        .route("/stages/:stage_id", post(activate_reserves_for_stage))
        .route("/teams/:team_id", post(activate_reserves_for_team))
        .route("/activate", post(activate_reserves))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
