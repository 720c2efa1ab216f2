use sqlx::PgPool;

use crate::error::Result;
use crate::models::ScoringRule;

pub struct ScoringRuleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ScoringRuleRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<ScoringRule>> {
        let rules = sqlx::query_as::<_, ScoringRule>(
            r#"
            SELECT rule_id, rule_type, position, jersey_type, points
            FROM scoring_rules
            ORDER BY rule_type, position NULLS LAST, jersey_type
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rules)
    }
}
