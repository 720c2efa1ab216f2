use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    StagePosition,
    Jersey,
    FinalClassification,
    FinalJersey,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StagePosition => "stage_position",
            Self::Jersey => "jersey",
            Self::FinalClassification => "final_classification",
            Self::FinalJersey => "final_jersey",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stage_position" => Ok(Self::StagePosition),
            "jersey" => Ok(Self::Jersey),
            "final_classification" => Ok(Self::FinalClassification),
            "final_jersey" => Ok(Self::FinalJersey),
            other => Err(ParseEnumError::new("rule type", other)),
        }
    }
}

impl TryFrom<String> for RuleType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A row of the scoring rules seed table.
///
/// `position` is set for `stage_position`, `final_classification` and
/// `final_jersey` rules; `jersey_type` for `jersey` and `final_jersey` rules.
/// The jersey type stays a plain string so a bad seed row degrades to a
/// missing rule instead of failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScoringRule {
    pub rule_id: Uuid,
    #[sqlx(try_from = "String")]
    pub rule_type: RuleType,
    pub position: Option<i32>,
    pub jersey_type: Option<String>,
    pub points: i32,
}
