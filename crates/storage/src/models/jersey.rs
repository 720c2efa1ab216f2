use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::ParseEnumError;

/// Classification jerseys handed out after every stage.
///
/// The names follow the league's own vocabulary: `geel` is the overall
/// leader, `groen` the points leader, `bolletjes` the best climber and `wit`
/// the best young rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JerseyType {
    Geel,
    Groen,
    Bolletjes,
    Wit,
}

impl JerseyType {
    /// Every jersey that must be assigned for a stage import to be accepted.
    pub const ALL: [JerseyType; 4] = [
        JerseyType::Geel,
        JerseyType::Groen,
        JerseyType::Bolletjes,
        JerseyType::Wit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geel => "geel",
            Self::Groen => "groen",
            Self::Bolletjes => "bolletjes",
            Self::Wit => "wit",
        }
    }

    /// Jerseys whose final standing earns `final_jersey` points. The final
    /// yellow jersey is rewarded through the final classification instead.
    pub fn has_final_jersey_award(&self) -> bool {
        !matches!(self, Self::Geel)
    }
}

impl fmt::Display for JerseyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JerseyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "geel" => Ok(Self::Geel),
            "groen" => Ok(Self::Groen),
            "bolletjes" => Ok(Self::Bolletjes),
            "wit" => Ok(Self::Wit),
            other => Err(ParseEnumError::new("jersey type", other)),
        }
    }
}

impl TryFrom<String> for JerseyType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The rider wearing a classification jersey after a stage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JerseyWearer {
    pub stage_id: Uuid,
    #[sqlx(try_from = "String")]
    pub jersey_type: JerseyType,
    pub rider_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GEEL".parse::<JerseyType>().unwrap(), JerseyType::Geel);
        assert_eq!(" wit ".parse::<JerseyType>().unwrap(), JerseyType::Wit);
    }

    #[test]
    fn test_parse_rejects_unknown_jersey() {
        let err = "rood".parse::<JerseyType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown jersey type: 'rood'");
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&JerseyType::Bolletjes).unwrap();
        assert_eq!(json, "\"bolletjes\"");

        let parsed: JerseyType = serde_json::from_str("\"groen\"").unwrap();
        assert_eq!(parsed, JerseyType::Groen);
    }

    #[test]
    fn test_only_yellow_has_no_final_jersey_award() {
        let awarded: Vec<_> = JerseyType::ALL
            .iter()
            .filter(|j| j.has_final_jersey_award())
            .collect();
        assert_eq!(
            awarded,
            vec![&JerseyType::Groen, &JerseyType::Bolletjes, &JerseyType::Wit]
        );
    }
}
