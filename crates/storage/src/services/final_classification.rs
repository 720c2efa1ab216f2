//! End-of-tour bonuses, awarded on the final stage on top of its regular
//! stage points.
//!
//! Both bonuses are added to `points_bonus`, so they must only run after the
//! stage points for the final stage were freshly calculated.

use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::dto::points::{CalculationSummary, FinalPointsSummary};
use crate::error::{Result, StorageError};
use crate::models::{EligibleRider, JerseyType};
use crate::repository::points::PointsRepository;
use crate::repository::results::ResultsRepository;
use crate::repository::roster::RosterRepository;
use crate::services::scoring_rules::{self, ScoringRules};
use crate::services::{stage_points, stage_status, standings};

/// Bonus per participant with eligible riders, ordered by participant id
pub type BonusTable = BTreeMap<Uuid, i32>;

/// Final classification bonus, keyed by each eligible rider's finishing
/// position on the final stage.
pub fn final_classification_bonus(
    rules: &ScoringRules,
    positions: &HashMap<Uuid, Option<i32>>,
    eligible: &[EligibleRider],
) -> BonusTable {
    let mut bonus = BonusTable::new();
    for rider in eligible {
        let position = positions.get(&rider.rider_id).copied().flatten();
        *bonus.entry(rider.participant_id).or_default() +=
            rules.final_classification_points(position);
    }
    bonus
}

/// Final jersey bonus for the riders wearing a jersey after the final stage.
///
/// Only the wearer (first place of that classification) is rewarded, and
/// only for jerseys with a final award.
pub fn final_jersey_bonus(
    rules: &ScoringRules,
    jerseys: &HashMap<Uuid, Vec<JerseyType>>,
    eligible: &[EligibleRider],
) -> BonusTable {
    let mut bonus = BonusTable::new();
    for rider in eligible {
        let points: i32 = jerseys
            .get(&rider.rider_id)
            .into_iter()
            .flatten()
            .filter(|jersey| jersey.has_final_jersey_award())
            .map(|jersey| rules.final_jersey_points(*jersey, 1))
            .sum();
        *bonus.entry(rider.participant_id).or_default() += points;
    }
    bonus
}

/// Add the final classification and final jersey bonuses for the final stage
pub async fn calculate_all_final_points(
    pool: &PgPool,
    final_stage_id: Uuid,
) -> Result<FinalPointsSummary> {
    let status = stage_status::resolve(pool, final_stage_id).await?;
    if !status.is_final {
        return Err(StorageError::NotFinalStage(final_stage_id));
    }
    if !status.counts_final_bonuses() {
        tracing::info!("Final stage was cancelled, no final bonuses awarded");
        return Ok(FinalPointsSummary::default());
    }

    let rules = scoring_rules::load(pool).await?;

    let results_repo = ResultsRepository::new(pool);
    let positions: HashMap<Uuid, Option<i32>> = results_repo
        .list_for_stage(final_stage_id)
        .await?
        .into_iter()
        .map(|r| (r.rider_id, r.position))
        .collect();
    let jerseys = stage_points::jerseys_by_rider(
        results_repo
            .jersey_wearers_for_stage(final_stage_id)
            .await?
            .into_iter()
            .map(|w| (w.jersey_type, w.rider_id)),
    );
    let eligible = RosterRepository::new(pool).eligible_riders().await?;

    let classification = final_classification_bonus(&rules, &positions, &eligible);
    let final_jerseys = final_jersey_bonus(&rules, &jerseys, &eligible);

    let mut tx = pool.begin().await?;
    for (participant_id, bonus) in classification.iter().chain(final_jerseys.iter()) {
        PointsRepository::add_bonus_points(&mut *tx, final_stage_id, *participant_id, *bonus)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(
        classification_points = classification.values().sum::<i32>(),
        jersey_points = final_jerseys.values().sum::<i32>(),
        "Final bonuses added for {} participants",
        classification.len()
    );

    Ok(FinalPointsSummary {
        final_classification: CalculationSummary {
            participants_calculated: classification.len(),
        },
        final_jerseys: CalculationSummary {
            participants_calculated: final_jerseys.len(),
        },
    })
}

/// Rescore the final stage from scratch: base stage points (which resets
/// `points_bonus`), then the final bonuses, then standings including them.
pub async fn rescore_final_stage(
    pool: &PgPool,
    final_stage_id: Uuid,
) -> Result<FinalPointsSummary> {
    if !stage_status::is_final_stage(pool, final_stage_id).await? {
        return Err(StorageError::NotFinalStage(final_stage_id));
    }

    stage_points::calculate_stage_points(pool, final_stage_id).await?;
    let summary = calculate_all_final_points(pool, final_stage_id).await?;
    standings::calculate_cumulative_points(pool, final_stage_id).await?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring_rules::test_support::league_rules;

    fn eligible(participant_id: Uuid, rider_id: Uuid) -> EligibleRider {
        EligibleRider {
            participant_id,
            rider_id,
        }
    }

    #[test]
    fn test_classification_bonus_by_final_position() {
        let rules = league_rules();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let (winner, runner_up, dnf) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let positions = HashMap::from([
            (winner, Some(1)),
            (runner_up, Some(2)),
            (dnf, None),
        ]);
        let riders = vec![
            eligible(p1, winner),
            eligible(p1, dnf),
            eligible(p2, runner_up),
        ];

        let bonus = final_classification_bonus(&rules, &positions, &riders);

        assert_eq!(bonus[&p1], 50);
        assert_eq!(bonus[&p2], 30);
    }

    #[test]
    fn test_participant_outside_the_podium_gets_zero_entry() {
        let rules = league_rules();
        let participant = Uuid::new_v4();
        let rider = Uuid::new_v4();
        let positions = HashMap::from([(rider, Some(40))]);

        let bonus = final_classification_bonus(&rules, &positions, &[eligible(participant, rider)]);

        assert_eq!(bonus.len(), 1);
        assert_eq!(bonus[&participant], 0);
    }

    #[test]
    fn test_final_jersey_bonus_skips_yellow() {
        let rules = league_rules();
        let participant = Uuid::new_v4();
        let (leader, sprinter, climber) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let jerseys = HashMap::from([
            (leader, vec![JerseyType::Geel, JerseyType::Wit]),
            (sprinter, vec![JerseyType::Groen]),
            (climber, vec![JerseyType::Bolletjes]),
        ]);
        let riders = vec![
            eligible(participant, leader),
            eligible(participant, sprinter),
            eligible(participant, climber),
        ];

        let bonus = final_jersey_bonus(&rules, &jerseys, &riders);

        assert_eq!(bonus[&participant], 15 + 25 + 25);
    }

    #[test]
    fn test_jersey_bonus_ignores_non_eligible_wearers() {
        let rules = league_rules();
        let participant = Uuid::new_v4();
        let main_rider = Uuid::new_v4();
        let benched_wearer = Uuid::new_v4();
        let jerseys = HashMap::from([(benched_wearer, vec![JerseyType::Groen])]);

        let bonus = final_jersey_bonus(&rules, &jerseys, &[eligible(participant, main_rider)]);

        assert_eq!(bonus[&participant], 0);
    }
}
