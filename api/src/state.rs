use common::db::DbPool;
use common::dq::DqRuleService;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<DbPool>,
    pub dq_rules: DqRuleService,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(
        db_pool: Option<DbPool>,
        dq_rules: DqRuleService,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            db_pool,
            dq_rules,
            metrics,
        }
    }
}
