//! Per-stage fantasy points.
//!
//! One calculator serves every stage; neutralized, cancelled and final
//! stages only differ through the [`StageStatus`] handed in.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::points::CalculationSummary;
use crate::error::Result;
use crate::models::{EligibleRider, JerseyType};
use crate::repository::participant::ParticipantRepository;
use crate::repository::points::PointsRepository;
use crate::repository::results::ResultsRepository;
use crate::repository::roster::RosterRepository;
use crate::repository::stage::StageRepository;
use crate::services::scoring_rules::{self, ScoringRules};
use crate::services::stage_status::StageStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PointsBreakdown {
    pub points_stage: i32,
    pub points_jerseys: i32,
    pub points_bonus: i32,
}

impl PointsBreakdown {
    pub fn total(&self) -> i32 {
        self.points_stage + self.points_jerseys + self.points_bonus
    }
}

/// Everything the calculator needs about one stage, already loaded
#[derive(Debug, Clone, Copy)]
pub struct StageScoringInput<'a> {
    pub status: StageStatus,
    pub rules: &'a ScoringRules,
    /// Rider to finishing position. Present with `None` means DNF/DNS.
    pub positions: &'a HashMap<Uuid, Option<i32>>,
    /// Rider to the jerseys worn after the stage
    pub jerseys: &'a HashMap<Uuid, Vec<JerseyType>>,
    pub eligible: &'a [EligibleRider],
    pub participants: &'a [Uuid],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePointsPlan {
    /// One row per participant, in the order participants were given
    pub rows: Vec<(Uuid, PointsBreakdown)>,
    /// Participants with at least one eligible rider
    pub participants_calculated: usize,
}

/// Zero rows for everyone, used for cancelled stages
pub fn zero_points_plan(participants: &[Uuid]) -> StagePointsPlan {
    StagePointsPlan {
        rows: participants
            .iter()
            .map(|id| (*id, PointsBreakdown::default()))
            .collect(),
        participants_calculated: 0,
    }
}

pub fn compute_stage_points(input: StageScoringInput<'_>) -> StagePointsPlan {
    if input.status.is_cancelled {
        return zero_points_plan(input.participants);
    }

    let mut by_participant: HashMap<Uuid, PointsBreakdown> = HashMap::new();

    for rider in input.eligible {
        let entry = by_participant.entry(rider.participant_id).or_default();

        if input.status.counts_position_points() {
            let position = input.positions.get(&rider.rider_id).copied().flatten();
            entry.points_stage += input.rules.stage_position_points(position);
        }

        if input.status.counts_jersey_points()
            && let Some(jerseys) = input.jerseys.get(&rider.rider_id)
        {
            entry.points_jerseys += jerseys
                .iter()
                .map(|jersey| input.rules.jersey_points(*jersey))
                .sum::<i32>();
        }
    }

    let participants_calculated = by_participant.len();

    let mut rows: Vec<(Uuid, PointsBreakdown)> = input
        .participants
        .iter()
        .map(|id| (*id, by_participant.remove(id).unwrap_or_default()))
        .collect();

    // Eligible riders of participants missing from the list still get their row.
    let mut leftovers: Vec<_> = by_participant.into_iter().collect();
    leftovers.sort_by_key(|(id, _)| *id);
    rows.extend(leftovers);

    StagePointsPlan {
        rows,
        participants_calculated,
    }
}

/// Group jersey wearer rows by rider
pub fn jerseys_by_rider<I>(wearers: I) -> HashMap<Uuid, Vec<JerseyType>>
where
    I: IntoIterator<Item = (JerseyType, Uuid)>,
{
    let mut map: HashMap<Uuid, Vec<JerseyType>> = HashMap::new();
    for (jersey_type, rider_id) in wearers {
        map.entry(rider_id).or_default().push(jersey_type);
    }
    map
}

/// Compute and store every participant's points for a stage, overwriting
/// earlier values for that stage.
pub async fn calculate_stage_points(pool: &PgPool, stage_id: Uuid) -> Result<CalculationSummary> {
    let stage_repo = StageRepository::new(pool);
    let stage = stage_repo.find_by_id(stage_id).await?;
    let status = StageStatus::from_stage(&stage, stage_repo.max_stage_number().await?);

    let participants = ParticipantRepository::new(pool).list_ids().await?;

    let plan = if status.is_cancelled {
        tracing::info!(stage_number = stage.stage_number, "Stage cancelled, writing zero points");
        zero_points_plan(&participants)
    } else {
        let rules = scoring_rules::load_for_stage_scoring(pool).await?;

        let results_repo = ResultsRepository::new(pool);
        let positions: HashMap<Uuid, Option<i32>> = results_repo
            .list_for_stage(stage_id)
            .await?
            .into_iter()
            .map(|r| (r.rider_id, r.position))
            .collect();
        let jerseys = jerseys_by_rider(
            results_repo
                .jersey_wearers_for_stage(stage_id)
                .await?
                .into_iter()
                .map(|w| (w.jersey_type, w.rider_id)),
        );
        let eligible = RosterRepository::new(pool).eligible_riders().await?;

        compute_stage_points(StageScoringInput {
            status,
            rules: &rules,
            positions: &positions,
            jerseys: &jerseys,
            eligible: &eligible,
            participants: &participants,
        })
    };

    let mut tx = pool.begin().await?;
    for (participant_id, points) in &plan.rows {
        PointsRepository::upsert_stage_points(&mut *tx, stage_id, *participant_id, *points).await?;
    }
    tx.commit().await?;

    tracing::info!(
        stage_number = stage.stage_number,
        neutralized = status.is_neutralized,
        is_final = status.is_final,
        rows = plan.rows.len(),
        "Stage points calculated for {} participants",
        plan.participants_calculated
    );

    Ok(CalculationSummary {
        participants_calculated: plan.participants_calculated,
    })
}
