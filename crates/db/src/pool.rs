use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use hcc_core::DbConfig;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row as _};

use crate::error::DbError;
use crate::executor::{Connector, QueryExecutor};
use crate::row::{Row, SqlValue};

/// Connections held per instance. Operations run sequentially.
const MAX_CONNECTIONS: u32 = 2;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

static INSTALL_DRIVERS: Once = Once::new();

/// [`QueryExecutor`] backed by an sqlx `AnyPool`.
#[derive(Debug, Clone)]
pub struct SqlxExecutor {
    pool: AnyPool,
}

impl SqlxExecutor {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`. The first connection is established eagerly so
    /// bad credentials surface here rather than on the first query.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);
        let pool = AnyPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl QueryExecutor for SqlxExecutor {
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        tracing::debug!(sql, "query");
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn exec(&self, sql: &str) -> Result<u64, DbError> {
        tracing::debug!(sql, "exec");
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn decode_row(row: &AnyRow) -> Result<Row, DbError> {
    (0..row.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>, _>>()
        .map(Row::new)
}

fn decode_value(row: &AnyRow, index: usize) -> Result<SqlValue, DbError> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.map_or(SqlValue::Null, SqlValue::Int));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.map_or(SqlValue::Null, SqlValue::Float));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return Ok(v.map_or(SqlValue::Null, SqlValue::Text));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return Ok(v.map_or(SqlValue::Null, SqlValue::Bool));
    }
    Err(DbError::Decode {
        index,
        reason: "unsupported column type".into(),
    })
}

/// Opens one [`SqlxExecutor`] per instance from its connection string.
#[derive(Debug, Clone, Default)]
pub struct SqlxConnector;

#[async_trait]
impl Connector for SqlxConnector {
    async fn connect(
        &self,
        db: &DbConfig,
        password: &str,
    ) -> Result<Arc<dyn QueryExecutor>, DbError> {
        tracing::debug!(dsn = %db.redacted_dsn(), "Connecting");
        let executor = SqlxExecutor::connect(&db.dsn(password)).await?;
        Ok(Arc::new(executor))
    }
}
