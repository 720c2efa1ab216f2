use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

pub struct ParticipantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipantRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every participant id, ordered by team name
    pub async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT participant_id FROM participants ORDER BY team_name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}
