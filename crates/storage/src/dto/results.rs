use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::JerseyType;

/// Request payload for importing one stage's results and jersey wearers
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportStageResultsRequest {
    #[validate(length(min = 1, message = "results must be a non-empty array"))]
    #[validate(custom(function = "validate_unique_results"))]
    #[validate(nested)]
    pub results: Vec<StageResultInput>,

    #[validate(custom(function = "validate_complete_jerseys"))]
    pub jerseys: Vec<JerseyAssignmentInput>,
}

/// A single finishing line. `position` is `None` for riders that did not finish.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageResultInput {
    #[validate(range(min = 1, message = "position must be >= 1"))]
    pub position: Option<i32>,

    pub rider_id: Uuid,

    #[validate(range(min = 0, message = "timeSeconds must be >= 0"))]
    #[serde(default)]
    pub time_seconds: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JerseyAssignmentInput {
    pub jersey_type: JerseyType,
    pub rider_id: Uuid,
}

impl ImportStageResultsRequest {
    /// Every rider referenced by the payload, results and jerseys combined.
    pub fn referenced_rider_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .map(|r| r.rider_id)
            .chain(self.jerseys.iter().map(|j| j.rider_id))
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

fn validation_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_unique_results(results: &[StageResultInput]) -> Result<(), ValidationError> {
    let mut riders = HashSet::new();
    let mut positions = HashSet::new();

    for result in results {
        if !riders.insert(result.rider_id) {
            return Err(validation_error(
                "duplicate_rider",
                format!("rider {} appears more than once", result.rider_id),
            ));
        }
        if let Some(position) = result.position
            && !positions.insert(position)
        {
            return Err(validation_error(
                "duplicate_position",
                format!("position {} is assigned more than once", position),
            ));
        }
    }

    Ok(())
}

fn validate_complete_jerseys(jerseys: &[JerseyAssignmentInput]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for jersey in jerseys {
        if !seen.insert(jersey.jersey_type) {
            return Err(validation_error(
                "duplicate_jersey",
                format!("jersey '{}' is assigned more than once", jersey.jersey_type),
            ));
        }
    }

    let missing: Vec<&str> = JerseyType::ALL
        .iter()
        .filter(|j| !seen.contains(j))
        .map(JerseyType::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(validation_error(
            "incomplete_jerseys",
            format!("all four jerseys are required, missing: {}", missing.join(", ")),
        ))
    }
}
