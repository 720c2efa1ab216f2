use std::collections::BTreeSet;
use validator::Validate;

use crate::payload::StageImportFile;
use crate::{ImporterError, Result};

/// Offline checks on a stage results file. Nothing here touches the database.
pub struct StageFileValidator;

impl StageFileValidator {
    pub fn validate(file: &StageImportFile) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        if file.stage_ref().is_none() {
            report
                .errors
                .push("File must contain stageId or stageNumber".to_string());
        }

        if let Err(errors) = file.payload.validate() {
            let reported = report.errors.len();
            for (field, field_errors) in errors.field_errors() {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    report.errors.push(format!("{}: {}", field, message));
                }
            }
            // Per-result range errors are nested and not part of field_errors().
            if report.errors.len() == reported {
                report.errors.push(errors.to_string());
            }
        }

        let results = &file.payload.results;

        let unplaced = results.iter().filter(|r| r.position.is_none()).count();
        if unplaced > 0 {
            report.warnings.push(format!(
                "{} rider(s) without a position (DNF/DNS)",
                unplaced
            ));
        }

        let untimed = results.iter().filter(|r| r.time_seconds.is_none()).count();
        if untimed > 0 {
            report
                .warnings
                .push(format!("{} rider(s) without a finishing time", untimed));
        }

        let positions: BTreeSet<i32> = results.iter().filter_map(|r| r.position).collect();
        if let Some(&last) = positions.last()
            && last as usize != positions.len()
        {
            let missing: Vec<String> = (1..last)
                .filter(|p| !positions.contains(p))
                .map(|p| p.to_string())
                .collect();
            if !missing.is_empty() {
                report
                    .warnings
                    .push(format!("Missing positions: {}", missing.join(", ")));
            }
        }

        if !report.errors.is_empty() {
            return Err(ImporterError::ValidationError(report.errors.join("; ")));
        }

        Ok(report)
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}
