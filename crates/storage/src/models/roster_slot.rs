use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ParseEnumError;

/// Number of scoring slots on a full roster.
pub const MAIN_ROSTER_SIZE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Main,
    Reserve,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Reserve => "reserve",
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "reserve" => Ok(Self::Reserve),
            other => Err(ParseEnumError::new("slot type", other)),
        }
    }
}

impl TryFrom<String> for SlotType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A rider assignment on a fantasy team (`fantasy_team_riders`).
///
/// Only `Main` slots with `active = true` earn points. For `Reserve` slots
/// `active` means the rider is still available on the bench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterSlot {
    pub slot_id: Uuid,
    pub fantasy_team_id: Uuid,
    pub rider_id: Uuid,
    #[sqlx(try_from = "String")]
    pub slot_type: SlotType,
    pub slot_number: i32,
    pub active: bool,
}

/// An eligible (main, active) roster row joined to its owning participant.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct EligibleRider {
    pub participant_id: Uuid,
    pub rider_id: Uuid,
}
