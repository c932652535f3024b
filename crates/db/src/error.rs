/// Errors surfaced by a [`QueryExecutor`](crate::QueryExecutor).
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The query succeeded but produced no rows.
    ///
    /// Kept distinct from real failures: several operations treat it as a
    /// successful no-op.
    #[error("No rows returned")]
    NoRows,

    /// A column could not be decoded into the requested type.
    #[error("Column {index}: {reason}")]
    Decode { index: usize, reason: String },

    /// A driver-level failure reported as text.
    #[error("Database error: {0}")]
    Driver(String),

    /// A failure from sqlx.
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),
}

impl DbError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, DbError::NoRows)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NoRows,
            other => DbError::Sqlx(other),
        }
    }
}
