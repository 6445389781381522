// Datasource repository implementation

use crate::db::DbPool;
use crate::dq::store::DataSourceStore;
use crate::errors::DatabaseError;
use crate::models::DataSource;
use async_trait::async_trait;
use tracing::instrument;

/// Read-only access to t_ds_datasource
pub struct DataSourceRepository {
    pool: DbPool,
}

impl DataSourceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataSourceStore for DataSourceRepository {
    #[instrument(skip(self))]
    async fn list_by_type(&self, db_type: i32) -> Result<Vec<DataSource>, DatabaseError> {
        let data_sources = sqlx::query_as::<_, DataSource>(
            r#"
            SELECT id, name, note, type, user_id, create_time, update_time
            FROM t_ds_datasource
            WHERE type = $1
            ORDER BY id
            "#,
        )
        .bind(db_type)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(db_type, count = data_sources.len(), "Found datasources by type");
        Ok(data_sources)
    }
}
