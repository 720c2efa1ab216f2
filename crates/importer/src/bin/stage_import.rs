use clap::{Parser, Subcommand};
use importer::{
    ImportContext, ImporterError, JsonFileSource, StageFileValidator, StageImportFile,
    StageResultSource,
};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use storage::services::{ingestion, reserve_activation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "stage-import")]
#[command(about = "Fantasy cycling league stage results importer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a stage results file and run the scoring pipeline
    Import { file: PathBuf },
    /// Recalculate points, standings and final bonuses for a stage
    Recalculate { stage_id: Uuid },
    /// Top up teams with reserves (every team unless a participant or stage is given)
    ActivateReserves {
        #[arg(long)]
        participant: Option<Uuid>,

        /// Replace main riders missing from this stage's results
        #[arg(long, conflicts_with = "participant")]
        stage: Option<Uuid>,
    },
    /// Check a stage results file without touching the database
    Validate { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "stage_import={},importer={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Validate { file } => {
            load_and_validate(&JsonFileSource::new(file)).await?;
        }
        Commands::Import { file } => {
            let context = connect(cli.database_url.as_deref()).await?;
            handle_import(&JsonFileSource::new(file), &context).await?;
        }
        Commands::Recalculate { stage_id } => {
            let context = connect(cli.database_url.as_deref()).await?;
            let report = ingestion::recalculate_stage(&context.pool, stage_id).await?;
            log_report(&report);
        }
        Commands::ActivateReserves { participant, stage } => {
            let context = connect(cli.database_url.as_deref()).await?;
            handle_activate_reserves(&context, participant, stage).await?;
        }
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> Result<ImportContext, ImporterError> {
    let database_url = database_url.ok_or(ImporterError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(ImportContext { pool })
}

async fn load_and_validate(
    source: &dyn StageResultSource,
) -> Result<StageImportFile, ImporterError> {
    tracing::info!("Loading stage results from: {}", source.describe());
    let file = source.load().await?;

    tracing::info!(
        "Loaded {} results and {} jersey wearers",
        file.payload.results.len(),
        file.payload.jerseys.len()
    );

    let report = StageFileValidator::validate(&file)?;
    report.log_warnings();
    tracing::info!("✓ Validation successful!");

    Ok(file)
}

async fn handle_import(
    source: &dyn StageResultSource,
    context: &ImportContext,
) -> Result<(), ImporterError> {
    let file = load_and_validate(source).await?;
    let stage = file.resolve_stage(&context.pool).await?;

    tracing::info!("Importing stage {} ({})", stage.stage_number, stage.name);
    let report = ingestion::import_stage_results(&context.pool, stage.stage_id, &file.payload)
        .await?;
    log_report(&report);

    Ok(())
}

async fn handle_activate_reserves(
    context: &ImportContext,
    participant: Option<Uuid>,
    stage: Option<Uuid>,
) -> Result<(), ImporterError> {
    let pool = &context.pool;

    match (participant, stage) {
        (Some(participant_id), _) => {
            let report =
                reserve_activation::activate_reserves_for_participant(pool, participant_id)
                    .await?;
            tracing::info!(
                "Team {}: {} reserves activated ({} → {} main riders)",
                report.fantasy_team_id,
                report.reserves_activated,
                report.active_main_count,
                report.new_active_main_count
            );
        }
        (None, Some(stage_id)) => {
            let report = reserve_activation::activate_reserves_for_stage(pool, stage_id).await?;
            tracing::info!(
                "{} reserves activated across {} teams",
                report.reserves_activated,
                report.teams_affected
            );
            for failure in &report.failed_teams {
                tracing::error!("  ✗ Team {}: {}", failure.fantasy_team_id, failure.error);
            }
        }
        (None, None) => {
            let response = reserve_activation::activate_reserves_for_all_teams(pool).await?;
            for team in &response.teams {
                tracing::info!(
                    "  Team {}: {} reserves activated",
                    team.fantasy_team_id,
                    team.reserves_activated
                );
            }
            tracing::info!(
                "Summary: {} reserves activated for {} team(s)",
                response.total_reserves_activated,
                response.teams.len()
            );
        }
    }

    Ok(())
}

fn log_report(report: &ingestion::ImportReport) {
    tracing::info!(
        "Stored {} results, pipeline reached {:?}",
        report.count,
        report.pipeline
    );
    tracing::info!(
        "Points for {} participants, {} reserves activated{}",
        report.participants_calculated,
        report.reserves_activated,
        if report.is_final_stage { " (final stage)" } else { "" }
    );

    let failures = [
        ("reserves", &report.reserve_error),
        ("points", &report.points_error),
        ("standings", &report.standings_error),
        ("final", &report.final_error),
    ];
    for (step, error) in failures {
        if let Some(error) = error {
            tracing::error!("  ✗ {}: {}", step, error);
        }
    }
}
