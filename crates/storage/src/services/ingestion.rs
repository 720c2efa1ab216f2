//! Stage result import and the scoring pipeline that follows it.
//!
//! The results and jersey wearers are written in one transaction. Everything
//! after that commit is best-effort: a failing step is logged and reported,
//! and the import itself stays committed.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeSet;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::results::{ImportStageResultsRequest, StageResultInput};
use crate::error::{Result, StorageError};
use crate::models::{JerseyType, Stage};
use crate::repository::results::{NewStageResult, ResultsRepository};
use crate::repository::stage::StageRepository;
use crate::services::{
    final_classification, reserve_activation, stage_points, stage_status, standings,
};

/// How far the scoring pipeline got for a stage. Each state implies all
/// earlier ones succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Committed,
    ComputedPoints,
    ComputedStandings,
    ComputedFinals,
}

impl PipelineStage {
    /// Move to `next` only when it directly follows the current state
    fn advance(self, next: PipelineStage) -> PipelineStage {
        let follows = matches!(
            (self, next),
            (Self::Committed, Self::ComputedPoints)
                | (Self::ComputedPoints, Self::ComputedStandings)
                | (Self::ComputedStandings, Self::ComputedFinals)
        );
        if follows { next } else { self }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Result rows stored for the stage
    pub count: u64,
    pub points_calculated: bool,
    pub participants_calculated: usize,
    pub reserves_activated: usize,
    pub pipeline: PipelineStage,
    pub is_final_stage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standings_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_error: Option<String>,
}

impl ImportReport {
    fn committed(count: u64, is_final_stage: bool) -> Self {
        Self {
            count,
            points_calculated: false,
            participants_calculated: 0,
            reserves_activated: 0,
            pipeline: PipelineStage::Committed,
            is_final_stage,
            reserve_error: None,
            points_error: None,
            standings_error: None,
            final_error: None,
        }
    }
}

/// How the final-stage steps ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum FinalsOutcome {
    Completed,
    BonusesFailed(String),
    /// Bonuses are stored but the standings do not include them yet
    StandingsFailed(String),
}

impl ImportReport {
    /// Apply the final-stage outcome. `ComputedFinals` is only reached once
    /// the standings include the bonuses. Returns the recorded error, if any.
    fn record_finals(&mut self, outcome: FinalsOutcome) -> Option<&str> {
        match outcome {
            FinalsOutcome::Completed => {
                self.pipeline = self.pipeline.advance(PipelineStage::ComputedFinals);
                return None;
            }
            FinalsOutcome::BonusesFailed(e) => {
                self.final_error = Some(format!("Final points failed: {}", e));
            }
            FinalsOutcome::StandingsFailed(e) => {
                self.final_error = Some(format!(
                    "Final bonuses stored but standings were not updated: {}",
                    e
                ));
            }
        }
        self.final_error.as_deref()
    }
}

/// Number riders by finishing time: riders with identical times share a
/// group, groups are numbered densely from the fastest time, and riders
/// without a time share one group after all timed groups.
pub fn assign_same_time_groups(results: &[StageResultInput]) -> Vec<NewStageResult> {
    let times: Vec<i32> = results
        .iter()
        .filter_map(|r| r.time_seconds)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let untimed_group = times.len() as i32 + 1;

    results
        .iter()
        .map(|result| {
            let same_time_group = match result.time_seconds {
                Some(time) => times
                    .binary_search(&time)
                    .map(|index| index as i32 + 1)
                    .unwrap_or(untimed_group),
                None => untimed_group,
            };
            NewStageResult {
                rider_id: result.rider_id,
                position: result.position,
                time_seconds: result.time_seconds,
                same_time_group: Some(same_time_group),
            }
        })
        .collect()
}

async fn validate_import(
    pool: &PgPool,
    stage_id: Uuid,
    request: &ImportStageResultsRequest,
) -> Result<Stage> {
    request
        .validate()
        .map_err(|e| StorageError::Validation(e.to_string()))?;

    let stage = StageRepository::new(pool).find_by_id(stage_id).await?;

    let unknown = ResultsRepository::new(pool)
        .unknown_riders(&request.referenced_rider_ids())
        .await?;
    if !unknown.is_empty() {
        let ids: Vec<String> = unknown.iter().map(Uuid::to_string).collect();
        return Err(StorageError::Validation(format!(
            "Unknown rider ids: {}",
            ids.join(", ")
        )));
    }

    Ok(stage)
}

/// Replace a stage's results and jersey wearers, then run the scoring pipeline.
///
/// Validation failures and errors before the commit leave the database
/// unchanged. After the commit only an `Unrecoverable` error is returned;
/// every other failure is reported in the `ImportReport`.
pub async fn import_stage_results(
    pool: &PgPool,
    stage_id: Uuid,
    request: &ImportStageResultsRequest,
) -> Result<ImportReport> {
    let stage = validate_import(pool, stage_id, request).await?;

    let rows = assign_same_time_groups(&request.results);
    let wearers: Vec<(JerseyType, Uuid)> = request
        .jerseys
        .iter()
        .map(|j| (j.jersey_type, j.rider_id))
        .collect();

    let mut tx = pool.begin().await?;
    // A rider deleted after validation surfaces here as a foreign key violation.
    ResultsRepository::replace_jersey_wearers(&mut *tx, stage_id, &wearers)
        .await
        .map_err(|e| e.reject_dangling_reference("jersey rider"))?;
    let count = ResultsRepository::replace_results(&mut *tx, stage_id, &rows)
        .await
        .map_err(|e| e.reject_dangling_reference("rider"))?;
    tx.commit().await?;

    tracing::info!(
        stage_number = stage.stage_number,
        "Imported {} results and {} jersey wearers",
        count,
        wearers.len()
    );

    let is_final = stage_status::resolve(pool, stage_id).await?.is_final;
    let mut report = ImportReport::committed(count, is_final);

    match reserve_activation::activate_reserves_for_stage(pool, stage_id).await {
        Ok(activation) => {
            report.reserves_activated = activation.reserves_activated;
            if !activation.failed_teams.is_empty() {
                let failures: Vec<String> = activation
                    .failed_teams
                    .iter()
                    .map(|f| format!("team {}: {}", f.fantasy_team_id, f.error))
                    .collect();
                report.reserve_error = Some(failures.join("; "));
            }
        }
        Err(e @ StorageError::Unrecoverable(_)) => {
            tracing::error!(stage_number = stage.stage_number, "Reserve activation failed: {}", e);
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(stage_number = stage.stage_number, "Reserve activation failed: {}", e);
            report.reserve_error = Some(e.to_string());
        }
    }

    run_scoring(pool, &stage, &mut report).await;

    Ok(report)
}

/// Rerun points, standings and final bonuses from the results already stored
pub async fn recalculate_stage(pool: &PgPool, stage_id: Uuid) -> Result<ImportReport> {
    let stage = StageRepository::new(pool).find_by_id(stage_id).await?;

    let count = ResultsRepository::new(pool).count_for_stage(stage_id).await?;
    if count == 0 {
        return Err(StorageError::Validation(format!(
            "Stage {} has no results to recalculate",
            stage.stage_number
        )));
    }

    let is_final = stage_status::resolve(pool, stage_id).await?.is_final;
    let mut report = ImportReport::committed(count as u64, is_final);

    run_scoring(pool, &stage, &mut report).await;

    Ok(report)
}

/// Points, standings and (on the final stage) final bonuses, each best-effort
async fn run_scoring(pool: &PgPool, stage: &Stage, report: &mut ImportReport) {
    let stage_id = stage.stage_id;

    match stage_points::calculate_stage_points(pool, stage_id).await {
        Ok(summary) => {
            report.points_calculated = true;
            report.participants_calculated = summary.participants_calculated;
            report.pipeline = report.pipeline.advance(PipelineStage::ComputedPoints);
        }
        Err(e) => {
            tracing::warn!(stage_number = stage.stage_number, "Stage points failed: {}", e);
            report.points_error = Some(e.to_string());
        }
    }

    match standings::calculate_cumulative_points(pool, stage_id).await {
        Ok(_) => {
            report.pipeline = report.pipeline.advance(PipelineStage::ComputedStandings);
        }
        Err(e) => {
            tracing::warn!(stage_number = stage.stage_number, "Standings failed: {}", e);
            report.standings_error = Some(e.to_string());
        }
    }

    if !report.is_final_stage {
        return;
    }

    // Final bonuses add onto points_bonus, which only a fresh points run resets.
    if !report.points_calculated {
        report.final_error =
            Some("Skipped: stage points for the final stage were not calculated".to_string());
        return;
    }

    let outcome = match final_classification::calculate_all_final_points(pool, stage_id).await {
        // Standings must include the bonuses just added.
        Ok(_) => match standings::calculate_cumulative_points(pool, stage_id).await {
            Ok(_) => FinalsOutcome::Completed,
            Err(e) => FinalsOutcome::StandingsFailed(e.to_string()),
        },
        Err(e) => FinalsOutcome::BonusesFailed(e.to_string()),
    };
    if let Some(error) = report.record_finals(outcome) {
        tracing::warn!(stage_number = stage.stage_number, "{}", error);
    }

    tracing::info!(
        stage_number = stage.stage_number,
        pipeline = ?report.pipeline,
        "Scoring pipeline finished"
    );
}
