// Repository layer for data-quality metadata

pub mod comparison_type;
pub mod datasource;
pub mod execute_sql;
pub mod input_entry;
mod queries;
pub mod rule;

pub use comparison_type::ComparisonTypeRepository;
pub use datasource::DataSourceRepository;
pub use execute_sql::RuleExecuteSqlRepository;
pub use input_entry::RuleInputEntryRepository;
pub use rule::RuleRepository;

use crate::db::DbPool;
use crate::dq::DqRuleService;
use crate::dq::DqServiceOptions;
use std::sync::Arc;

/// Wire a rule service to PostgreSQL-backed repositories
pub fn postgres_rule_service(pool: DbPool, options: DqServiceOptions) -> DqRuleService {
    DqRuleService::new(
        Arc::new(RuleRepository::new(pool.clone())),
        Arc::new(RuleInputEntryRepository::new(pool.clone())),
        Arc::new(RuleExecuteSqlRepository::new(pool.clone())),
        Arc::new(DataSourceRepository::new(pool.clone())),
        Arc::new(ComparisonTypeRepository::new(pool)),
        options,
    )
}
