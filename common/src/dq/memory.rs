// In-memory store used by tests and by local runs without PostgreSQL

use super::store::{
    ComparisonTypeStore, DataSourceStore, Page, RuleExecuteSqlStore, RuleInputEntryStore,
    RuleQuery, RuleStore,
};
use crate::errors::DatabaseError;
use crate::models::{DataSource, DqComparisonType, DqRule, DqRuleExecuteSql, DqRuleInputEntry};
use async_trait::async_trait;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Immutable snapshot of data-quality metadata.
///
/// Built up front with the `with_*` methods; every read is served from the
/// snapshot, in insertion order unless the operation defines its own order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDqStore {
    rules: Vec<DqRule>,
    input_entries: HashMap<i32, Vec<DqRuleInputEntry>>,
    execute_sqls: HashMap<i32, Vec<DqRuleExecuteSql>>,
    data_sources: Vec<DataSource>,
    comparison_types: Vec<DqComparisonType>,
}

impl InMemoryDqStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: DqRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_input_entries(mut self, rule_id: i32, entries: Vec<DqRuleInputEntry>) -> Self {
        self.input_entries.entry(rule_id).or_default().extend(entries);
        self
    }

    pub fn with_execute_sqls(mut self, rule_id: i32, sqls: Vec<DqRuleExecuteSql>) -> Self {
        self.execute_sqls.entry(rule_id).or_default().extend(sqls);
        self
    }

    pub fn with_data_source(mut self, data_source: DataSource) -> Self {
        self.data_sources.push(data_source);
        self
    }

    pub fn with_comparison_type(mut self, comparison_type: DqComparisonType) -> Self {
        self.comparison_types.push(comparison_type);
        self
    }
}

#[async_trait]
impl RuleStore for InMemoryDqStore {
    async fn list_all(&self) -> Result<Vec<DqRule>, DatabaseError> {
        Ok(self.rules.clone())
    }

    async fn query_paged(&self, query: &RuleQuery) -> Result<Option<Page<DqRule>>, DatabaseError> {
        let mut matching: Vec<&DqRule> = self.rules.iter().filter(|r| query.matches(r)).collect();
        matching.sort_by_key(|r| Reverse(r.update_time));

        let total = matching.len() as i64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let records = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(Some(Page { records, total }))
    }
}

#[async_trait]
impl RuleInputEntryStore for InMemoryDqStore {
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleInputEntry>, DatabaseError> {
        Ok(self.input_entries.get(&rule_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl RuleExecuteSqlStore for InMemoryDqStore {
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleExecuteSql>, DatabaseError> {
        Ok(self.execute_sqls.get(&rule_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DataSourceStore for InMemoryDqStore {
    async fn list_by_type(&self, db_type: i32) -> Result<Vec<DataSource>, DatabaseError> {
        Ok(self
            .data_sources
            .iter()
            .filter(|ds| ds.db_type == db_type)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ComparisonTypeStore for InMemoryDqStore {
    async fn list_ordered_by_id_asc(&self) -> Result<Vec<DqComparisonType>, DatabaseError> {
        let mut types = self.comparison_types.clone();
        types.sort_by_key(|t| t.id);
        Ok(types)
    }
}
