use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request payload for filling vacant main slots on one team
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivateTeamReservesRequest {
    #[validate(range(min = 0, max = 10))]
    pub needed_count: i32,
    #[validate(range(min = 0, max = 10))]
    pub current_active_main_count: i32,
}

/// Request payload for activating reserves for a participant or every team
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivateReservesRequest {
    pub participant_id: Option<Uuid>,
    #[serde(default)]
    pub activate_all: bool,
}

impl ActivateReservesRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.activate_all && self.participant_id.is_none() {
            return Err("participantId is required (or set activateAll to true)".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamActivationResponse {
    pub fantasy_team_id: Uuid,
    pub activated_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivateReservesResponse {
    pub total_reserves_activated: usize,
    pub teams: Vec<TeamFillReport>,
}

/// Reserves promoted into vacant main slots for a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamFillReport {
    pub fantasy_team_id: Uuid,
    pub participant_id: Uuid,
    pub active_main_count: i32,
    pub reserves_activated: usize,
    pub new_active_main_count: i32,
}

/// Outcome of reserve activation after a stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageActivationReport {
    pub reserves_activated: usize,
    /// Teams with at least one main rider missing from the results
    pub teams_affected: usize,
    /// Teams whose moves were rolled back
    pub failed_teams: Vec<TeamActivationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamActivationFailure {
    pub fantasy_team_id: Uuid,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_requires_target() {
        assert!(ActivateReservesRequest::default().validate().is_err());

        let all = ActivateReservesRequest {
            participant_id: None,
            activate_all: true,
        };
        assert!(all.validate().is_ok());

        let one = ActivateReservesRequest {
            participant_id: Some(Uuid::new_v4()),
            activate_all: false,
        };
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_team_request_bounds() {
        let request = ActivateTeamReservesRequest {
            needed_count: 11,
            current_active_main_count: 3,
        };
        assert!(request.validate().is_err());
    }
}
