use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::path::PathBuf;
use storage::{
    dto::results::ImportStageResultsRequest, models::Stage, repository::stage::StageRepository,
};
use uuid::Uuid;

use crate::traits::StageResultSource;
use crate::{ImporterError, Result};

/// A stage results file: the stage it belongs to plus the import payload.
///
/// ```json
/// {
///   "stageNumber": 5,
///   "results": [{ "position": 1, "riderId": "...", "timeSeconds": 17280 }],
///   "jerseys": [{ "jerseyType": "geel", "riderId": "..." }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageImportFile {
    pub stage_id: Option<Uuid>,
    pub stage_number: Option<i32>,
    #[serde(flatten)]
    pub payload: ImportStageResultsRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRef {
    Id(Uuid),
    Number(i32),
}

impl StageImportFile {
    /// The stage id wins when a file names both
    pub fn stage_ref(&self) -> Option<StageRef> {
        match (self.stage_id, self.stage_number) {
            (Some(id), _) => Some(StageRef::Id(id)),
            (None, Some(number)) => Some(StageRef::Number(number)),
            (None, None) => None,
        }
    }

    pub async fn resolve_stage(&self, pool: &PgPool) -> Result<Stage> {
        let repo = StageRepository::new(pool);
        let stage = match self.stage_ref() {
            Some(StageRef::Id(id)) => repo.find_by_id(id).await?,
            Some(StageRef::Number(number)) => repo.find_by_number(number).await?,
            None => {
                return Err(ImporterError::ValidationError(
                    "File must contain stageId or stageNumber".to_string(),
                ));
            }
        };
        Ok(stage)
    }
}

/// Results read from a JSON file on disk
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl StageResultSource for JsonFileSource {
    async fn load(&self) -> Result<StageImportFile> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let file = serde_json::from_str(&content)?;
        Ok(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_json(stage: serde_json::Value) -> serde_json::Value {
        let rider = Uuid::new_v4();
        let mut value = json!({
            "results": [{ "position": 1, "riderId": rider, "timeSeconds": 17280 }],
            "jerseys": [
                { "jerseyType": "geel", "riderId": rider },
                { "jerseyType": "groen", "riderId": rider },
                { "jerseyType": "bolletjes", "riderId": rider },
                { "jerseyType": "wit", "riderId": rider }
            ]
        });
        if let (Some(target), Some(extra)) = (value.as_object_mut(), stage.as_object()) {
            target.extend(extra.clone());
        }
        value
    }

    #[test]
    fn test_parses_stage_number_and_payload() {
        let file: StageImportFile = serde_json::from_value(file_json(json!({ "stageNumber": 5 })))
            .unwrap();

        assert_eq!(file.stage_ref(), Some(StageRef::Number(5)));
        assert_eq!(file.payload.results.len(), 1);
        assert_eq!(file.payload.jerseys.len(), 4);
    }

    #[test]
    fn test_stage_id_takes_precedence() {
        let id = Uuid::new_v4();
        let file: StageImportFile =
            serde_json::from_value(file_json(json!({ "stageId": id, "stageNumber": 3 }))).unwrap();

        assert_eq!(file.stage_ref(), Some(StageRef::Id(id)));
    }

    #[test]
    fn test_missing_stage_reference() {
        let file: StageImportFile = serde_json::from_value(file_json(json!({}))).unwrap();
        assert_eq!(file.stage_ref(), None);
    }

    #[tokio::test]
    async fn test_json_file_source_reads_file() {
        let path = std::env::temp_dir().join(format!("stage-import-{}.json", Uuid::new_v4()));
        let content = serde_json::to_string(&file_json(json!({ "stageNumber": 21 }))).unwrap();
        tokio::fs::write(&path, content).await.unwrap();

        let source = JsonFileSource::new(&path);
        let file = source.load().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(file.stage_ref(), Some(StageRef::Number(21)));
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let source = JsonFileSource::new("/nonexistent/stage.json");
        assert!(matches!(source.load().await, Err(ImporterError::IoError(_))));
    }
}
