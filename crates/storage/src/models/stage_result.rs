use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A rider's result in a stage. A `None` position means DNF/DNS.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StageResult {
    pub stage_result_id: Uuid,
    pub stage_id: Uuid,
    pub rider_id: Uuid,
    pub position: Option<i32>,
    pub time_seconds: Option<i32>,
    /// Riders finishing with identical times share a group (display only)
    pub same_time_group: Option<i32>,
}
