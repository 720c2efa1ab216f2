use crate::Result;
use crate::payload::StageImportFile;
use sqlx::PgPool;

pub struct ImportContext {
    pub pool: PgPool,
}

/// Anything that can hand over one stage's results for import
#[async_trait::async_trait]
pub trait StageResultSource: Send + Sync {
    async fn load(&self) -> Result<StageImportFile>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}
