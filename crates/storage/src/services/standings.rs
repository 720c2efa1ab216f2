use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::points::CalculationSummary;
use crate::error::{Result, StorageError};
use crate::repository::points::{ParticipantTotal, PointsRepository};
use crate::repository::stage::StageRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTotal {
    pub participant_id: Uuid,
    pub team_name: String,
    pub total_points: i32,
    pub rank: i32,
}

/// Order totals (points descending, team name then participant id ascending) and assign
/// competition ranks: tied totals share a rank and the next rank skips ahead.
pub fn rank_standings(mut totals: Vec<ParticipantTotal>) -> Result<Vec<RankedTotal>> {
    totals.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.team_name.cmp(&b.team_name))
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    let mut ranked: Vec<RankedTotal> = Vec::with_capacity(totals.len());
    for (index, total) in totals.into_iter().enumerate() {
        let total_points = i32::try_from(total.total_points).map_err(|_| {
            StorageError::Validation(format!(
                "Total of {} points for participant {} is out of range",
                total.total_points, total.participant_id
            ))
        })?;

        let rank = match ranked.last() {
            Some(previous) if previous.total_points == total_points => previous.rank,
            _ => index as i32 + 1,
        };

        ranked.push(RankedTotal {
            participant_id: total.participant_id,
            team_name: total.team_name,
            total_points,
            rank,
        });
    }

    Ok(ranked)
}

/// Recompute every participant's running total and rank as of `stage_id`
pub async fn calculate_cumulative_points(
    pool: &PgPool,
    stage_id: Uuid,
) -> Result<CalculationSummary> {
    let stage = StageRepository::new(pool).find_by_id(stage_id).await?;

    let totals = PointsRepository::new(pool)
        .totals_through_stage(stage.stage_number)
        .await?;
    let ranked = rank_standings(totals)?;

    let mut tx = pool.begin().await?;
    for entry in &ranked {
        PointsRepository::upsert_cumulative_points(
            &mut *tx,
            entry.participant_id,
            stage_id,
            entry.total_points,
            entry.rank,
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(
        stage_number = stage.stage_number,
        leader = ranked.first().map(|r| r.team_name.as_str()).unwrap_or("-"),
        "Standings calculated for {} participants",
        ranked.len()
    );

    Ok(CalculationSummary {
        participants_calculated: ranked.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(team_name: &str, total_points: i64) -> ParticipantTotal {
        ParticipantTotal {
            participant_id: Uuid::new_v4(),
            team_name: team_name.to_string(),
            total_points,
        }
    }

    fn ranks(ranked: &[RankedTotal]) -> Vec<i32> {
        ranked.iter().map(|r| r.rank).collect()
    }

    #[test]
    fn test_competition_ranking_with_ties() {
        let ranked = rank_standings(vec![
            total("Delta", 80),
            total("Bravo", 90),
            total("Alpha", 100),
            total("Charlie", 90),
        ])
        .unwrap();

        assert_eq!(ranks(&ranked), vec![1, 2, 2, 4]);
        assert_eq!(ranked[0].team_name, "Alpha");
        assert_eq!(ranked[3].team_name, "Delta");
    }

    #[test]
    fn test_ties_are_listed_by_team_name() {
        let ranked = rank_standings(vec![
            total("Zwaluw", 50),
            total("Arend", 50),
            total("Mees", 50),
        ])
        .unwrap();

        let names: Vec<&str> = ranked.iter().map(|r| r.team_name.as_str()).collect();
        assert_eq!(names, vec!["Arend", "Mees", "Zwaluw"]);
        assert_eq!(ranks(&ranked), vec![1, 1, 1]);
    }

    #[test]
    fn test_identical_team_names_order_by_participant_id() {
        let mut first = total("De Ploeg", 30);
        let mut second = total("De Ploeg", 30);
        first.participant_id = Uuid::from_u128(1);
        second.participant_id = Uuid::from_u128(2);

        let forward = rank_standings(vec![first.clone(), second.clone()]).unwrap();
        let reversed = rank_standings(vec![second, first]).unwrap();

        assert_eq!(forward, reversed);
        assert_eq!(forward[0].participant_id, Uuid::from_u128(1));
    }

    #[test]
    fn test_participants_without_points_are_ranked() {
        let ranked = rank_standings(vec![total("Ploeg A", 0), total("Ploeg B", 12)]).unwrap();

        assert_eq!(ranks(&ranked), vec![1, 2]);
        assert_eq!(ranked[1].total_points, 0);
    }

    #[test]
    fn test_rank_after_a_tie_skips_ahead() {
        let ranked = rank_standings(vec![
            total("A", 10),
            total("B", 10),
            total("C", 10),
            total("D", 5),
            total("E", 5),
            total("F", 1),
        ])
        .unwrap();

        assert_eq!(ranks(&ranked), vec![1, 1, 1, 4, 4, 6]);
    }

    #[test]
    fn test_empty_standings() {
        assert!(rank_standings(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_total_is_rejected() {
        let result = rank_standings(vec![total("Te Veel", i64::from(i32::MAX) + 1)]);
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }
}
