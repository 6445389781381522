// Rule repository implementation

use super::queries::rule_queries;
use crate::db::DbPool;
use crate::dq::store::{Page, RuleQuery, RuleStore};
use crate::errors::DatabaseError;
use crate::models::DqRule;
use async_trait::async_trait;
use tracing::instrument;

/// Repository for t_ds_dq_rule
pub struct RuleRepository {
    pool: DbPool,
}

impl RuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `%term%` with LIKE metacharacters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl RuleStore for RuleRepository {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<DqRule>, DatabaseError> {
        let rules = sqlx::query_as::<_, DqRule>(&format!(
            "{} ORDER BY a.id",
            rule_queries::SELECT_WITH_USER
        ))
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = rules.len(), "Listed all rules");
        Ok(rules)
    }

    #[instrument(skip(self))]
    async fn query_paged(&self, query: &RuleQuery) -> Result<Option<Page<DqRule>>, DatabaseError> {
        let pattern = query.search_term().map(like_pattern);
        let rule_type = query.rule_type.as_code();

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM t_ds_dq_rule a {}",
            rule_queries::PAGE_FILTER
        ))
        .bind(&pattern)
        .bind(rule_type)
        .bind(query.start)
        .bind(query.end)
        .fetch_one(self.pool.pool())
        .await?;

        let records = sqlx::query_as::<_, DqRule>(&format!(
            "{} {} ORDER BY a.update_time DESC LIMIT $5 OFFSET $6",
            rule_queries::SELECT_WITH_USER,
            rule_queries::PAGE_FILTER
        ))
        .bind(&pattern)
        .bind(rule_type)
        .bind(query.start)
        .bind(query.end)
        .bind(i64::from(query.page_size))
        .bind(query.offset())
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(total, returned = records.len(), "Queried rule page");
        Ok(Some(Page { records, total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("null"), "%null%");
        assert_eq!(like_pattern("100%_ok"), "%100\\%\\_ok%");
    }
}
