// Persistence capabilities the rule service depends on

use crate::errors::DatabaseError;
use crate::models::{
    DataSource, DqComparisonType, DqRule, DqRuleExecuteSql, DqRuleInputEntry, RuleTypeFilter,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// One page of rows as returned by a store, with the size of the full result
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: i64,
}

/// Filter and window for paged rule queries
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleQuery {
    /// Case-insensitive substring of the rule name
    pub search_text: Option<String>,
    pub rule_type: RuleTypeFilter,
    /// Exclusive lower bound on `update_time`
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound on `update_time`
    pub end: Option<NaiveDateTime>,
    /// 1-based
    pub page_number: u32,
    pub page_size: u32,
}

impl RuleQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number.saturating_sub(1)) * i64::from(self.page_size)
    }

    /// Search text with surrounding whitespace removed; blank means no search
    pub fn search_term(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether a rule passes every filter of this query
    pub fn matches(&self, rule: &DqRule) -> bool {
        if let Some(term) = self.search_term() {
            if !rule.name.to_lowercase().contains(&term.to_lowercase()) {
                return false;
            }
        }
        if !self.rule_type.matches(rule.rule_type) {
            return false;
        }
        if let Some(start) = self.start {
            if !rule.update_time.is_some_and(|t| t > start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            if !rule.update_time.is_some_and(|t| t <= end) {
                return false;
            }
        }
        true
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rules in the store's default order
    async fn list_all(&self) -> Result<Vec<DqRule>, DatabaseError>;

    /// Filtered page ordered by `update_time` descending
    async fn query_paged(&self, query: &RuleQuery) -> Result<Option<Page<DqRule>>, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleInputEntryStore: Send + Sync {
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleInputEntry>, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleExecuteSqlStore: Send + Sync {
    async fn list_by_rule_id(&self, rule_id: i32) -> Result<Vec<DqRuleExecuteSql>, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSourceStore: Send + Sync {
    async fn list_by_type(&self, db_type: i32) -> Result<Vec<DataSource>, DatabaseError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComparisonTypeStore: Send + Sync {
    async fn list_ordered_by_id_asc(&self) -> Result<Vec<DqComparisonType>, DatabaseError>;
}
