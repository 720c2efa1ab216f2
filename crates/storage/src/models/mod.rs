mod jersey;
mod participant;
mod roster_slot;
mod scoring_rule;
mod stage;
mod stage_result;

pub use jersey::{JerseyType, JerseyWearer};
pub use participant::FantasyTeam;
pub use roster_slot::{EligibleRider, MAIN_ROSTER_SIZE, RosterSlot, SlotType};
pub use scoring_rule::{RuleType, ScoringRule};
pub use stage::Stage;
pub use stage_result::StageResult;

/// Raised when a database string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
