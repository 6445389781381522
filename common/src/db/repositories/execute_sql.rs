// Rule execute SQL repository implementation

use super::queries::execute_sql_queries;
use crate::db::DbPool;
use crate::dq::store::RuleExecuteSqlStore;
use crate::errors::DatabaseError;
use crate::models::DqRuleExecuteSql;
use async_trait::async_trait;
use tracing::instrument;

pub struct RuleExecuteSqlRepository {
    pool: DbPool,
}

impl RuleExecuteSqlRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleExecuteSqlStore for RuleExecuteSqlRepository {
    #[instrument(skip(self))]
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleExecuteSql>, DatabaseError> {
        let sqls = sqlx::query_as::<_, DqRuleExecuteSql>(execute_sql_queries::SELECT_BY_RULE)
            .bind(rule_id)
            .fetch_all(self.pool.pool())
            .await?;

        Ok(sqls)
    }
}
