// Data-quality rule administration: listings and rule input forms

pub mod form;
pub mod memory;
pub mod normalize;
pub mod service;
pub mod store;

pub use form::{JsonEncoding, ParamsOptions, PluginParams};
pub use memory::InMemoryDqStore;
pub use service::{DqRuleService, DqServiceOptions, RulePageRequest};
pub use store::{
    ComparisonTypeStore, DataSourceStore, Page, RuleExecuteSqlStore, RuleInputEntryStore,
    RuleQuery, RuleStore,
};
