// Comparison type repository implementation

use crate::db::DbPool;
use crate::dq::store::ComparisonTypeStore;
use crate::errors::DatabaseError;
use crate::models::DqComparisonType;
use async_trait::async_trait;
use tracing::instrument;

pub struct ComparisonTypeRepository {
    pool: DbPool,
}

impl ComparisonTypeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComparisonTypeStore for ComparisonTypeRepository {
    #[instrument(skip(self))]
    async fn list_ordered_by_id_asc(&self) -> Result<Vec<DqComparisonType>, DatabaseError> {
        let types = sqlx::query_as::<_, DqComparisonType>(
            r#"
            SELECT id, type, execute_sql, output_table, name, is_inner_source,
                   create_time, update_time
            FROM t_ds_dq_comparison_type
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        Ok(types)
    }
}
