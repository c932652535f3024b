//! The seam between cleanup logic and a live database connection.

use std::sync::Arc;

use async_trait::async_trait;
use hcc_core::DbConfig;

use crate::error::DbError;
use crate::row::Row;

/// Executes statement text against one database instance.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a query and return every row.
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Run a query expected to produce a single row.
    ///
    /// Returns [`DbError::NoRows`] when the result set is empty.
    async fn query_row(&self, sql: &str) -> Result<Row, DbError> {
        self.query(sql)
            .await?
            .into_iter()
            .next()
            .ok_or(DbError::NoRows)
    }

    /// Run a statement and return the number of affected rows.
    async fn exec(&self, sql: &str) -> Result<u64, DbError>;
}

/// Opens connections to configured instances.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `db` with the resolved password and verify the connection.
    async fn connect(&self, db: &DbConfig, password: &str)
        -> Result<Arc<dyn QueryExecutor>, DbError>;
}
