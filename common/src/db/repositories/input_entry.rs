// Rule input entry repository implementation

use super::queries::input_entry_queries;
use crate::db::DbPool;
use crate::dq::store::RuleInputEntryStore;
use crate::errors::DatabaseError;
use crate::models::DqRuleInputEntry;
use async_trait::async_trait;
use tracing::instrument;

/// Repository for t_ds_dq_rule_input_entry joined with its rule relation
pub struct RuleInputEntryRepository {
    pool: DbPool,
}

impl RuleInputEntryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleInputEntryStore for RuleInputEntryRepository {
    #[instrument(skip(self))]
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleInputEntry>, DatabaseError> {
        let entries = sqlx::query_as::<_, DqRuleInputEntry>(input_entry_queries::SELECT_BY_RULE)
            .bind(rule_id)
            .fetch_all(self.pool.pool())
            .await?;

        tracing::debug!(rule_id, count = entries.len(), "Found rule input entries");
        Ok(entries)
    }
}
