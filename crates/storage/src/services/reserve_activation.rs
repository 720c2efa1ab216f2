//! Promotion of reserve riders into main roster slots.
//!
//! Planning is pure and works on the slots already loaded for one team. The
//! moves of a team are then applied in a single transaction with the active
//! slot constraint deferred to commit, so a team is either fully moved or
//! left untouched.

use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::dto::reserves::{
    ActivateReservesResponse, StageActivationReport, TeamActivationFailure, TeamFillReport,
};
use crate::error::{Result, StorageError};
use crate::models::{FantasyTeam, MAIN_ROSTER_SIZE, RosterSlot, SlotType};
use crate::repository::results::ResultsRepository;
use crate::repository::roster::RosterRepository;
use crate::repository::stage::StageRepository;

/// A reserve moving into a main slot number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub reserve_slot_id: Uuid,
    pub rider_id: Uuid,
    pub slot_number: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamMovePlan {
    /// Main slots to deactivate
    pub deactivate: Vec<Uuid>,
    pub promotions: Vec<Promotion>,
    /// Vacated slot numbers still held by another active main row
    pub skipped: Vec<i32>,
}

impl TeamMovePlan {
    pub fn is_empty(&self) -> bool {
        self.deactivate.is_empty() && self.promotions.is_empty()
    }
}

fn by_slot_number(slots: &[RosterSlot]) -> Vec<&RosterSlot> {
    let mut sorted: Vec<&RosterSlot> = slots.iter().collect();
    sorted.sort_by_key(|slot| slot.slot_number);
    sorted
}

/// Plan the moves for a team after a stage.
///
/// Every active main rider missing from `present` loses their slot. The
/// vacated slots are handed to the available reserves in slot order; slots
/// without a reserve stay empty.
pub fn plan_stage_activation(
    active_mains: &[RosterSlot],
    reserves: &[RosterSlot],
    present: &HashSet<Uuid>,
) -> TeamMovePlan {
    let (dropped, staying): (Vec<&RosterSlot>, Vec<&RosterSlot>) = by_slot_number(active_mains)
        .into_iter()
        .partition(|slot| !present.contains(&slot.rider_id));

    if dropped.is_empty() {
        return TeamMovePlan::default();
    }

    let held: HashSet<i32> = staying.iter().map(|slot| slot.slot_number).collect();
    let mut plan = TeamMovePlan {
        deactivate: dropped.iter().map(|slot| slot.slot_id).collect(),
        ..TeamMovePlan::default()
    };

    for (vacated, reserve) in dropped.iter().zip(by_slot_number(reserves)) {
        if held.contains(&vacated.slot_number) {
            plan.skipped.push(vacated.slot_number);
            continue;
        }
        plan.promotions.push(Promotion {
            reserve_slot_id: reserve.slot_id,
            rider_id: reserve.rider_id,
            slot_number: vacated.slot_number,
        });
    }

    plan
}

/// Plan filling up to `needed` vacant main slot numbers with reserves.
///
/// With `still_racing` set, reserves outside that set are passed over.
pub fn plan_vacancy_fill(
    active_mains: &[RosterSlot],
    reserves: &[RosterSlot],
    needed: usize,
    still_racing: Option<&HashSet<Uuid>>,
) -> TeamMovePlan {
    let held: HashSet<i32> = active_mains.iter().map(|slot| slot.slot_number).collect();
    let vacant = (1..=MAIN_ROSTER_SIZE).filter(|number| !held.contains(number));
    let candidates = by_slot_number(reserves)
        .into_iter()
        .filter(|reserve| still_racing.is_none_or(|racing| racing.contains(&reserve.rider_id)));

    let promotions = vacant
        .zip(candidates)
        .take(needed)
        .map(|(slot_number, reserve)| Promotion {
            reserve_slot_id: reserve.slot_id,
            rider_id: reserve.rider_id,
            slot_number,
        })
        .collect();

    TeamMovePlan {
        promotions,
        ..TeamMovePlan::default()
    }
}

/// Reserves a team needs to get back to a full set of main riders
pub fn needed_reserves(active_main_count: i32) -> usize {
    (MAIN_ROSTER_SIZE - active_main_count).max(0) as usize
}

fn slot_conflict(err: StorageError, fantasy_team_id: Uuid) -> StorageError {
    if err.is_exclusion_violation() || err.is_unique_violation() {
        StorageError::ConstraintViolation(format!(
            "Roster slot conflict for team {}: {}",
            fantasy_team_id, err
        ))
    } else {
        err
    }
}

async fn stage_moves(
    conn: &mut PgConnection,
    fantasy_team_id: Uuid,
    plan: &TeamMovePlan,
) -> Result<usize> {
    RosterRepository::defer_slot_constraint(conn).await?;

    for slot_id in &plan.deactivate {
        RosterRepository::deactivate_slot(conn, *slot_id).await?;
    }

    let mut promoted = 0;
    for promotion in &plan.promotions {
        if RosterRepository::main_slot_taken(
            conn,
            fantasy_team_id,
            promotion.slot_number,
            promotion.reserve_slot_id,
        )
        .await?
        {
            tracing::warn!(
                team = %fantasy_team_id,
                slot_number = promotion.slot_number,
                "Main slot already taken, reserve {} not promoted",
                promotion.rider_id
            );
            continue;
        }

        if RosterRepository::promote_to_main(conn, promotion.reserve_slot_id, promotion.slot_number)
            .await?
        {
            promoted += 1;
        }
    }

    Ok(promoted)
}

/// Apply a team's moves atomically. Returns the number of reserves promoted.
///
/// Slot conflicts come back as `ConstraintViolation` with the team untouched.
/// A failed rollback leaves the roster in an unknown state and is reported as
/// `Unrecoverable`.
pub async fn apply_team_plan(
    pool: &PgPool,
    fantasy_team_id: Uuid,
    plan: &TeamMovePlan,
) -> Result<usize> {
    if plan.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;

    match stage_moves(&mut *tx, fantasy_team_id, plan).await {
        Ok(promoted) => {
            tx.commit()
                .await
                .map_err(|e| slot_conflict(e.into(), fantasy_team_id))?;
            Ok(promoted)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                return Err(StorageError::Unrecoverable(format!(
                    "Rollback of roster moves for team {} failed: {} (after: {})",
                    fantasy_team_id, rollback_err, e
                )));
            }
            Err(slot_conflict(e, fantasy_team_id))
        }
    }
}

/// Replace every main rider missing from a stage's results with a reserve.
///
/// Teams are processed one at a time; a team whose moves conflict is rolled
/// back and listed in the report while the others proceed.
pub async fn activate_reserves_for_stage(
    pool: &PgPool,
    stage_id: Uuid,
) -> Result<StageActivationReport> {
    let stage = StageRepository::new(pool).find_by_id(stage_id).await?;

    let present: HashSet<Uuid> = ResultsRepository::new(pool)
        .list_for_stage(stage_id)
        .await?
        .into_iter()
        .map(|result| result.rider_id)
        .collect();

    let mut report = StageActivationReport::default();

    if present.is_empty() {
        tracing::warn!(
            stage_number = stage.stage_number,
            "Stage has no results, skipping reserve activation"
        );
        return Ok(report);
    }

    let roster = RosterRepository::new(pool);

    for team in roster.list_teams().await? {
        let mains = roster
            .active_slots(team.fantasy_team_id, SlotType::Main)
            .await?;
        let reserves = roster
            .active_slots(team.fantasy_team_id, SlotType::Reserve)
            .await?;

        let plan = plan_stage_activation(&mains, &reserves, &present);
        if plan.is_empty() {
            continue;
        }
        report.teams_affected += 1;

        for slot_number in &plan.skipped {
            tracing::warn!(
                team = %team.fantasy_team_id,
                slot_number,
                "Vacated slot is held by another active main rider, skipping promotion"
            );
        }

        match apply_team_plan(pool, team.fantasy_team_id, &plan).await {
            Ok(promoted) => {
                tracing::debug!(
                    team = %team.fantasy_team_id,
                    dropped = plan.deactivate.len(),
                    promoted,
                    "Roster updated"
                );
                report.reserves_activated += promoted;
            }
            Err(StorageError::ConstraintViolation(message)) => {
                tracing::warn!(team = %team.fantasy_team_id, "Roster moves rolled back: {}", message);
                report.failed_teams.push(TeamActivationFailure {
                    fantasy_team_id: team.fantasy_team_id,
                    error: message,
                });
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        stage_number = stage.stage_number,
        teams_affected = report.teams_affected,
        failed = report.failed_teams.len(),
        "Activated {} reserves",
        report.reserves_activated
    );

    Ok(report)
}

/// Fill vacant main slots of one team with up to `needed_count` reserves
pub async fn activate_reserves_for_team(
    pool: &PgPool,
    fantasy_team_id: Uuid,
    needed_count: usize,
    current_active_main_count: i32,
) -> Result<usize> {
    let roster = RosterRepository::new(pool);
    let team = roster.find_team(fantasy_team_id).await?;

    let activated = fill_vacancies(pool, &team, needed_count, None).await?;

    tracing::info!(
        team = %fantasy_team_id,
        current_active_main_count,
        needed_count,
        "Activated {} reserves",
        activated
    );

    Ok(activated)
}

async fn fill_vacancies(
    pool: &PgPool,
    team: &FantasyTeam,
    needed: usize,
    still_racing: Option<&HashSet<Uuid>>,
) -> Result<usize> {
    if needed == 0 {
        return Ok(0);
    }

    let roster = RosterRepository::new(pool);
    let mains = roster
        .active_slots(team.fantasy_team_id, SlotType::Main)
        .await?;
    let reserves = roster
        .active_slots(team.fantasy_team_id, SlotType::Reserve)
        .await?;

    let plan = plan_vacancy_fill(&mains, &reserves, needed, still_racing);
    apply_team_plan(pool, team.fantasy_team_id, &plan).await
}

/// Riders in the most recent stage that has results, if any stage has them
async fn latest_finishers(pool: &PgPool) -> Result<Option<HashSet<Uuid>>> {
    let Some(stage) = StageRepository::new(pool).latest_with_results().await? else {
        return Ok(None);
    };

    let riders = ResultsRepository::new(pool)
        .list_for_stage(stage.stage_id)
        .await?
        .into_iter()
        .map(|result| result.rider_id)
        .collect();

    Ok(Some(riders))
}

async fn top_up_team(
    pool: &PgPool,
    team: &FantasyTeam,
    still_racing: Option<&HashSet<Uuid>>,
) -> Result<TeamFillReport> {
    let active_main_count = RosterRepository::new(pool)
        .active_slots(team.fantasy_team_id, SlotType::Main)
        .await?
        .len() as i32;

    let needed = needed_reserves(active_main_count);
    let activated = fill_vacancies(pool, team, needed, still_racing).await?;

    Ok(TeamFillReport {
        fantasy_team_id: team.fantasy_team_id,
        participant_id: team.participant_id,
        active_main_count,
        reserves_activated: activated,
        new_active_main_count: active_main_count + activated as i32,
    })
}

/// Bring a participant's team back to a full set of main riders
pub async fn activate_reserves_for_participant(
    pool: &PgPool,
    participant_id: Uuid,
) -> Result<TeamFillReport> {
    let team = RosterRepository::new(pool)
        .find_team_by_participant(participant_id)
        .await?;
    let still_racing = latest_finishers(pool).await?;

    top_up_team(pool, &team, still_racing.as_ref()).await
}

/// Bring every team back to a full set of main riders. Only teams that
/// received reserves are listed.
pub async fn activate_reserves_for_all_teams(pool: &PgPool) -> Result<ActivateReservesResponse> {
    let still_racing = latest_finishers(pool).await?;

    let mut response = ActivateReservesResponse {
        total_reserves_activated: 0,
        teams: Vec::new(),
    };

    for team in RosterRepository::new(pool).list_teams().await? {
        let report = top_up_team(pool, &team, still_racing.as_ref()).await?;
        if report.reserves_activated > 0 {
            response.total_reserves_activated += report.reserves_activated;
            response.teams.push(report);
        }
    }

    tracing::info!(
        teams = response.teams.len(),
        "Activated {} reserves across all teams",
        response.total_reserves_activated
    );

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Team {
        id: Uuid,
        mains: Vec<RosterSlot>,
        reserves: Vec<RosterSlot>,
    }

    impl Team {
        fn new(main_count: i32, reserve_count: i32) -> Self {
            let id = Uuid::new_v4();
            let slot = |slot_type, slot_number| RosterSlot {
                slot_id: Uuid::new_v4(),
                fantasy_team_id: id,
                rider_id: Uuid::new_v4(),
                slot_type,
                slot_number,
                active: true,
            };
            Self {
                id,
                mains: (1..=main_count).map(|n| slot(SlotType::Main, n)).collect(),
                reserves: (1..=reserve_count)
                    .map(|n| slot(SlotType::Reserve, n))
                    .collect(),
            }
        }

        fn main(&self, slot_number: i32) -> &RosterSlot {
            self.mains
                .iter()
                .find(|slot| slot.slot_number == slot_number)
                .unwrap()
        }

        /// Every main rider finished except those in `missing`
        fn present_except(&self, missing: &[i32]) -> HashSet<Uuid> {
            self.mains
                .iter()
                .filter(|slot| !missing.contains(&slot.slot_number))
                .chain(self.reserves.iter())
                .map(|slot| slot.rider_id)
                .collect()
        }
    }

    #[test]
    fn test_missing_riders_are_replaced_in_slot_order() {
        let team = Team::new(10, 5);
        let present = team.present_except(&[3, 7]);

        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        assert_eq!(
            plan.deactivate,
            vec![team.main(3).slot_id, team.main(7).slot_id]
        );
        assert_eq!(
            plan.promotions,
            vec![
                Promotion {
                    reserve_slot_id: team.reserves[0].slot_id,
                    rider_id: team.reserves[0].rider_id,
                    slot_number: 3,
                },
                Promotion {
                    reserve_slot_id: team.reserves[1].slot_id,
                    rider_id: team.reserves[1].rider_id,
                    slot_number: 7,
                },
            ]
        );
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_team_plays_short_without_enough_reserves() {
        let team = Team::new(10, 1);
        let present = team.present_except(&[2, 5, 9]);

        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        assert_eq!(plan.deactivate.len(), 3);
        assert_eq!(plan.promotions.len(), 1);
        assert_eq!(plan.promotions[0].slot_number, 2);
    }

    #[test]
    fn test_reserve_order_does_not_depend_on_input_order() {
        let mut team = Team::new(10, 3);
        team.reserves.reverse();
        let present = team.present_except(&[4]);

        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        let first_reserve = team
            .reserves
            .iter()
            .find(|slot| slot.slot_number == 1)
            .unwrap();
        assert_eq!(plan.promotions[0].reserve_slot_id, first_reserve.slot_id);
    }

    #[test]
    fn test_complete_team_needs_no_moves() {
        let team = Team::new(10, 5);
        let present = team.present_except(&[]);

        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        assert!(plan.is_empty());
    }

    #[test]
    fn test_rerun_after_promotion_is_a_no_op() {
        let team = Team::new(10, 5);
        let present = team.present_except(&[3, 7]);
        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        // Roster as it looks once the plan is applied.
        let dropped: HashSet<Uuid> = plan.deactivate.iter().copied().collect();
        let promoted: HashSet<Uuid> = plan.promotions.iter().map(|p| p.reserve_slot_id).collect();
        let mut mains: Vec<RosterSlot> = team
            .mains
            .iter()
            .filter(|slot| !dropped.contains(&slot.slot_id))
            .cloned()
            .collect();
        for promotion in &plan.promotions {
            mains.push(RosterSlot {
                slot_id: promotion.reserve_slot_id,
                fantasy_team_id: team.id,
                rider_id: promotion.rider_id,
                slot_type: SlotType::Main,
                slot_number: promotion.slot_number,
                active: true,
            });
        }
        let reserves: Vec<RosterSlot> = team
            .reserves
            .iter()
            .filter(|slot| !promoted.contains(&slot.slot_id))
            .cloned()
            .collect();

        let rerun = plan_stage_activation(&mains, &reserves, &present);

        assert!(rerun.is_empty());
    }

    #[test]
    fn test_occupied_target_slot_is_skipped() {
        let mut team = Team::new(10, 2);
        // Data anomaly: a second active main row also claims slot 3.
        let mut duplicate = team.main(3).clone();
        duplicate.slot_id = Uuid::new_v4();
        duplicate.rider_id = Uuid::new_v4();
        team.mains.push(duplicate.clone());

        let mut present = team.present_except(&[3]);
        present.insert(duplicate.rider_id);

        let plan = plan_stage_activation(&team.mains, &team.reserves, &present);

        assert_eq!(plan.deactivate, vec![team.main(3).slot_id]);
        assert!(plan.promotions.is_empty());
        assert_eq!(plan.skipped, vec![3]);
    }

    #[test]
    fn test_vacancy_fill_uses_lowest_free_slots() {
        let mut team = Team::new(10, 5);
        team.mains.retain(|slot| ![2, 6, 8].contains(&slot.slot_number));

        let plan = plan_vacancy_fill(&team.mains, &team.reserves, 2, None);

        let slots: Vec<i32> = plan.promotions.iter().map(|p| p.slot_number).collect();
        assert_eq!(slots, vec![2, 6]);
        assert_eq!(plan.promotions[0].reserve_slot_id, team.reserves[0].slot_id);
        assert!(plan.deactivate.is_empty());
    }

    #[test]
    fn test_vacancy_fill_is_bounded_by_reserves_and_vacancies() {
        let mut team = Team::new(10, 1);
        team.mains.retain(|slot| slot.slot_number > 3);
        let plan = plan_vacancy_fill(&team.mains, &team.reserves, 3, None);
        assert_eq!(plan.promotions.len(), 1);

        let full = Team::new(10, 5);
        let plan = plan_vacancy_fill(&full.mains, &full.reserves, 4, None);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_vacancy_fill_passes_over_riders_no_longer_racing() {
        let mut team = Team::new(10, 3);
        team.mains.retain(|slot| slot.slot_number != 5);
        let racing: HashSet<Uuid> = [team.reserves[1].rider_id].into_iter().collect();

        let plan = plan_vacancy_fill(&team.mains, &team.reserves, 1, Some(&racing));

        assert_eq!(plan.promotions.len(), 1);
        assert_eq!(plan.promotions[0].rider_id, team.reserves[1].rider_id);
        assert_eq!(plan.promotions[0].slot_number, 5);
    }

    #[test]
    fn test_needed_reserves() {
        assert_eq!(needed_reserves(10), 0);
        assert_eq!(needed_reserves(7), 3);
        assert_eq!(needed_reserves(12), 0);
    }
}
