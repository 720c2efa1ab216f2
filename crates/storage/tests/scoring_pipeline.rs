//! Database-backed scoring tests. Each test gets a fresh database with the
//! crate's migrations (including the seeded league scoring table) applied.

use sqlx::PgPool;
use storage::dto::results::{ImportStageResultsRequest, JerseyAssignmentInput, StageResultInput};
use storage::models::JerseyType;
use storage::services::{final_classification, ingestion, reserve_activation, stage_points};
use uuid::Uuid;

async fn insert_stage(pool: &PgPool, stage_number: i32, is_cancelled: bool) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO stages (stage_number, name, is_cancelled) VALUES ($1, $2, $3) RETURNING stage_id",
    )
    .bind(stage_number)
    .bind(format!("Stage {}", stage_number))
    .bind(is_cancelled)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_rider(pool: &PgPool, last_name: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO riders (first_name, last_name) VALUES ('Test', $1) RETURNING rider_id",
    )
    .bind(last_name)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A participant with a fantasy team, returning (participant_id, fantasy_team_id)
async fn insert_team(pool: &PgPool, team_name: &str) -> (Uuid, Uuid) {
    let participant_id: Uuid = sqlx::query_scalar(
        "INSERT INTO participants (team_name) VALUES ($1) RETURNING participant_id",
    )
    .bind(team_name)
    .fetch_one(pool)
    .await
    .unwrap();
    let team_id: Uuid = sqlx::query_scalar(
        "INSERT INTO fantasy_teams (participant_id) VALUES ($1) RETURNING fantasy_team_id",
    )
    .bind(participant_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (participant_id, team_id)
}

async fn insert_slot(pool: &PgPool, team_id: Uuid, rider_id: Uuid, slot_type: &str, slot: i32) {
    sqlx::query(
        r#"
        INSERT INTO fantasy_team_riders (fantasy_team_id, rider_id, slot_type, slot_number)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(team_id)
    .bind(rider_id)
    .bind(slot_type)
    .bind(slot)
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_result(pool: &PgPool, stage_id: Uuid, rider_id: Uuid, position: Option<i32>) {
    sqlx::query("INSERT INTO stage_results (stage_id, rider_id, position) VALUES ($1, $2, $3)")
        .bind(stage_id)
        .bind(rider_id)
        .bind(position)
        .execute(pool)
        .await
        .unwrap();
}

async fn insert_jersey(pool: &PgPool, stage_id: Uuid, jersey: &str, rider_id: Uuid) {
    sqlx::query(
        "INSERT INTO stage_jersey_wearers (stage_id, jersey_type, rider_id) VALUES ($1, $2, $3)",
    )
    .bind(stage_id)
    .bind(jersey)
    .bind(rider_id)
    .execute(pool)
    .await
    .unwrap();
}

/// (points_stage, points_jerseys, points_bonus, total_points)
async fn stage_points_row(
    pool: &PgPool,
    stage_id: Uuid,
    participant_id: Uuid,
) -> (i32, i32, i32, i32) {
    sqlx::query_as(
        r#"
        SELECT points_stage, points_jerseys, points_bonus, total_points
        FROM fantasy_stage_points
        WHERE stage_id = $1 AND participant_id = $2
        "#,
    )
    .bind(stage_id)
    .bind(participant_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Two-stage tour where the final stage is won by the team's only main rider
struct FinalStageTour {
    final_stage: Uuid,
    participant: Uuid,
    winner: Uuid,
    outsider: Uuid,
}

async fn final_stage_tour(pool: &PgPool, final_cancelled: bool) -> FinalStageTour {
    insert_stage(pool, 1, false).await;
    let final_stage = insert_stage(pool, 2, final_cancelled).await;
    let winner = insert_rider(pool, "Winnaar").await;
    let outsider = insert_rider(pool, "Buitenstaander").await;
    let (participant, team) = insert_team(pool, "De Kopgroep").await;
    insert_slot(pool, team, winner, "main", 1).await;

    FinalStageTour {
        final_stage,
        participant,
        winner,
        outsider,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_final_bonus_adds_onto_base_points(pool: PgPool) {
    let tour = final_stage_tour(&pool, false).await;
    insert_result(&pool, tour.final_stage, tour.winner, Some(1)).await;
    insert_result(&pool, tour.final_stage, tour.outsider, Some(2)).await;
    insert_jersey(&pool, tour.final_stage, "geel", tour.winner).await;
    insert_jersey(&pool, tour.final_stage, "groen", tour.outsider).await;

    stage_points::calculate_stage_points(&pool, tour.final_stage)
        .await
        .unwrap();
    assert_eq!(
        stage_points_row(&pool, tour.final_stage, tour.participant).await,
        (30, 0, 0, 30)
    );

    let summary = final_classification::calculate_all_final_points(&pool, tour.final_stage)
        .await
        .unwrap();

    assert_eq!(summary.final_classification.participants_calculated, 1);
    assert_eq!(
        stage_points_row(&pool, tour.final_stage, tour.participant).await,
        (30, 0, 50, 80)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rescoring_the_final_stage_does_not_accumulate(pool: PgPool) {
    let tour = final_stage_tour(&pool, false).await;
    insert_result(&pool, tour.final_stage, tour.winner, Some(1)).await;
    insert_jersey(&pool, tour.final_stage, "wit", tour.winner).await;

    final_classification::rescore_final_stage(&pool, tour.final_stage)
        .await
        .unwrap();
    final_classification::rescore_final_stage(&pool, tour.final_stage)
        .await
        .unwrap();

    assert_eq!(
        stage_points_row(&pool, tour.final_stage, tour.participant).await,
        (30, 0, 50 + 15, 95)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_stage_points_are_overwritten_on_rerun(pool: PgPool) {
    let tour = final_stage_tour(&pool, false).await;
    let first_stage: Uuid = sqlx::query_scalar("SELECT stage_id FROM stages WHERE stage_number = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    insert_result(&pool, first_stage, tour.winner, Some(2)).await;

    stage_points::calculate_stage_points(&pool, first_stage)
        .await
        .unwrap();
    sqlx::query("UPDATE stage_results SET position = 1 WHERE stage_id = $1")
        .bind(first_stage)
        .execute(&pool)
        .await
        .unwrap();
    stage_points::calculate_stage_points(&pool, first_stage)
        .await
        .unwrap();

    assert_eq!(
        stage_points_row(&pool, first_stage, tour.participant).await,
        (30, 0, 0, 30)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancelled_final_stage_scores_zero_after_import(pool: PgPool) {
    let tour = final_stage_tour(&pool, true).await;
    let (benchless, _) = insert_team(&pool, "Zonder Renners").await;

    let request = ImportStageResultsRequest {
        results: vec![StageResultInput {
            position: Some(1),
            rider_id: tour.winner,
            time_seconds: Some(15_000),
        }],
        jerseys: JerseyType::ALL
            .iter()
            .map(|jersey_type| JerseyAssignmentInput {
                jersey_type: *jersey_type,
                rider_id: tour.winner,
            })
            .collect(),
    };

    let report = ingestion::import_stage_results(&pool, tour.final_stage, &request)
        .await
        .unwrap();

    assert!(report.is_final_stage);
    assert!(report.final_error.is_none());
    assert_eq!(report.pipeline, ingestion::PipelineStage::ComputedFinals);
    assert_eq!(
        stage_points_row(&pool, tour.final_stage, tour.participant).await,
        (0, 0, 0, 0)
    );
    assert_eq!(
        stage_points_row(&pool, tour.final_stage, benchless).await,
        (0, 0, 0, 0)
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_missing_mains_are_replaced_in_their_slots(pool: PgPool) {
    let stage = insert_stage(&pool, 1, false).await;
    let (_, team) = insert_team(&pool, "De Waaier").await;

    let mut mains = Vec::new();
    for slot in 1..=10 {
        let rider = insert_rider(&pool, &format!("Knecht {}", slot)).await;
        insert_slot(&pool, team, rider, "main", slot).await;
        mains.push(rider);
    }
    let first_reserve = insert_rider(&pool, "Reserve Een").await;
    let second_reserve = insert_rider(&pool, "Reserve Twee").await;
    insert_slot(&pool, team, first_reserve, "reserve", 1).await;
    insert_slot(&pool, team, second_reserve, "reserve", 2).await;

    for (index, rider) in mains.iter().enumerate() {
        let slot = index as i32 + 1;
        if slot != 3 && slot != 7 {
            insert_result(&pool, stage, *rider, Some(slot)).await;
        }
    }
    insert_result(&pool, stage, first_reserve, Some(11)).await;
    insert_result(&pool, stage, second_reserve, None).await;

    let report = reserve_activation::activate_reserves_for_stage(&pool, stage)
        .await
        .unwrap();

    assert_eq!(report.reserves_activated, 2);
    assert_eq!(report.teams_affected, 1);
    assert!(report.failed_teams.is_empty());

    let active_mains: Vec<(i32, Uuid)> = sqlx::query_as(
        r#"
        SELECT slot_number, rider_id FROM fantasy_team_riders
        WHERE fantasy_team_id = $1 AND slot_type = 'main' AND active = true
        ORDER BY slot_number
        "#,
    )
    .bind(team)
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(active_mains.len(), 10);
    assert_eq!(active_mains[2], (3, first_reserve));
    assert_eq!(active_mains[6], (7, second_reserve));

    // A rerun finds nothing left to replace.
    let rerun = reserve_activation::activate_reserves_for_stage(&pool, stage)
        .await
        .unwrap();
    assert_eq!(rerun.reserves_activated, 0);
    assert_eq!(rerun.teams_affected, 0);
}
