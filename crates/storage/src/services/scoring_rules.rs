//! Lookup tables built from the `scoring_rules` seed data.
//!
//! Every lookup that misses resolves to zero points. The only hard failure
//! is a rules table without any stage position rule, which means the seed
//! data was never loaded.

use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::{Result, StorageError};
use crate::models::{JerseyType, RuleType, ScoringRule};
use crate::repository::scoring_rule::ScoringRuleRepository;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringRules {
    stage_position: HashMap<i32, i32>,
    jersey: HashMap<JerseyType, i32>,
    final_classification: HashMap<i32, i32>,
    final_jersey: HashMap<String, i32>,
}

/// Key of a `final_jersey` rule: the jersey plus the podium position in its
/// final standing.
pub fn final_jersey_key(jersey_type: &str, position: i32) -> String {
    format!("{}:{}", jersey_type, position)
}

impl ScoringRules {
    pub fn from_rules<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = ScoringRule>,
    {
        let mut table = Self::default();

        for rule in rules {
            match rule.rule_type {
                RuleType::StagePosition => {
                    if let Some(position) = rule.position {
                        table.stage_position.insert(position, rule.points);
                    }
                }
                RuleType::FinalClassification => {
                    if let Some(position) = rule.position {
                        table.final_classification.insert(position, rule.points);
                    }
                }
                RuleType::Jersey => match rule.jersey_type.as_deref().map(str::parse::<JerseyType>) {
                    Some(Ok(jersey_type)) => {
                        table.jersey.insert(jersey_type, rule.points);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(rule_id = %rule.rule_id, "Ignoring jersey rule: {}", e);
                    }
                    None => {}
                },
                RuleType::FinalJersey => {
                    if let (Some(jersey_type), Some(position)) = (&rule.jersey_type, rule.position)
                    {
                        table.final_jersey.insert(
                            final_jersey_key(&jersey_type.trim().to_lowercase(), position),
                            rule.points,
                        );
                    }
                }
            }
        }

        table
    }

    pub fn has_stage_position_rules(&self) -> bool {
        !self.stage_position.is_empty()
    }

    /// Points for a finishing position. DNF/DNS (`None`) earns nothing.
    pub fn stage_position_points(&self, position: Option<i32>) -> i32 {
        position
            .and_then(|p| self.stage_position.get(&p).copied())
            .unwrap_or(0)
    }

    pub fn jersey_points(&self, jersey_type: JerseyType) -> i32 {
        self.jersey.get(&jersey_type).copied().unwrap_or(0)
    }

    pub fn final_classification_points(&self, position: Option<i32>) -> i32 {
        position
            .and_then(|p| self.final_classification.get(&p).copied())
            .unwrap_or(0)
    }

    pub fn final_jersey_points(&self, jersey_type: JerseyType, position: i32) -> i32 {
        self.final_jersey
            .get(&final_jersey_key(jersey_type.as_str(), position))
            .copied()
            .unwrap_or(0)
    }
}

/// Load every rule type
pub async fn load(pool: &PgPool) -> Result<ScoringRules> {
    let repo = ScoringRuleRepository::new(pool);
    let rules = repo.list_all().await?;
    Ok(ScoringRules::from_rules(rules))
}

/// Load the rules needed to score a stage, failing if no stage position rules exist
pub async fn load_for_stage_scoring(pool: &PgPool) -> Result<ScoringRules> {
    let rules = load(pool).await?;
    if !rules.has_stage_position_rules() {
        return Err(StorageError::MissingScoringRules);
    }
    Ok(rules)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use uuid::Uuid;

    pub fn rule(
        rule_type: RuleType,
        position: Option<i32>,
        jersey_type: Option<&str>,
        points: i32,
    ) -> ScoringRule {
        ScoringRule {
            rule_id: Uuid::new_v4(),
            rule_type,
            position,
            jersey_type: jersey_type.map(String::from),
            points,
        }
    }

    /// The league's published points table
    pub fn league_rules() -> ScoringRules {
        let positions = [30, 15, 12, 9, 8, 7, 6, 5, 4, 3];
        let mut rules: Vec<ScoringRule> = positions
            .iter()
            .enumerate()
            .map(|(i, points)| rule(RuleType::StagePosition, Some(i as i32 + 1), None, *points))
            .collect();

        rules.extend([
            rule(RuleType::Jersey, None, Some("geel"), 10),
            rule(RuleType::Jersey, None, Some("groen"), 5),
            rule(RuleType::Jersey, None, Some("bolletjes"), 5),
            rule(RuleType::Jersey, None, Some("wit"), 3),
            rule(RuleType::FinalClassification, Some(1), None, 50),
            rule(RuleType::FinalClassification, Some(2), None, 30),
            rule(RuleType::FinalJersey, Some(1), Some("groen"), 25),
            rule(RuleType::FinalJersey, Some(1), Some("bolletjes"), 25),
            rule(RuleType::FinalJersey, Some(1), Some("wit"), 15),
        ]);

        ScoringRules::from_rules(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{league_rules, rule};
    use super::*;

    #[test]
    fn test_position_points_follow_the_table() {
        let rules = league_rules();
        assert_eq!(rules.stage_position_points(Some(1)), 30);
        assert_eq!(rules.stage_position_points(Some(2)), 15);
        assert_eq!(rules.stage_position_points(Some(10)), 3);
    }

    #[test]
    fn test_missing_entries_resolve_to_zero() {
        let rules = league_rules();
        assert_eq!(rules.stage_position_points(Some(11)), 0);
        assert_eq!(rules.stage_position_points(None), 0);
        assert_eq!(rules.final_classification_points(Some(3)), 0);
        assert_eq!(rules.final_jersey_points(JerseyType::Groen, 2), 0);
        assert_eq!(rules.final_jersey_points(JerseyType::Geel, 1), 0);
    }

    #[test]
    fn test_jersey_and_final_lookups() {
        let rules = league_rules();
        assert_eq!(rules.jersey_points(JerseyType::Geel), 10);
        assert_eq!(rules.jersey_points(JerseyType::Wit), 3);
        assert_eq!(rules.final_classification_points(Some(1)), 50);
        assert_eq!(rules.final_jersey_points(JerseyType::Bolletjes, 1), 25);
    }

    #[test]
    fn test_unknown_jersey_rule_is_ignored() {
        let rules = ScoringRules::from_rules(vec![
            rule(RuleType::StagePosition, Some(1), None, 30),
            rule(RuleType::Jersey, None, Some("rood"), 99),
        ]);
        assert!(rules.has_stage_position_rules());
        for jersey in JerseyType::ALL {
            assert_eq!(rules.jersey_points(jersey), 0);
        }
    }

    #[test]
    fn test_empty_table_has_no_stage_position_rules() {
        let rules = ScoringRules::from_rules(vec![rule(RuleType::Jersey, None, Some("geel"), 10)]);
        assert!(!rules.has_stage_position_rules());
    }

    #[test]
    fn test_final_jersey_key_format() {
        assert_eq!(final_jersey_key("groen", 1), "groen:1");
    }
}
