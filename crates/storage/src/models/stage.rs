use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One day's race within the tour. `stage_number` defines race order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Stage {
    pub stage_id: Uuid,
    pub stage_number: i32,
    pub name: String,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub distance_km: Option<i32>,
    pub stage_date: Option<NaiveDate>,
    /// Position points are voided, jersey points still count
    pub is_neutralized: bool,
    /// No points of any kind
    pub is_cancelled: bool,
    pub created_at: NaiveDateTime,
}
