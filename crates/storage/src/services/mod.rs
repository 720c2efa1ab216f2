pub mod final_classification;
pub mod ingestion;
pub mod reserve_activation;
pub mod scoring_rules;
pub mod stage_points;
pub mod stage_status;
pub mod standings;
