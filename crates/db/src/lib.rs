//! `hcc-db` -- database access for housekeeping runs.
//!
//! Cleanup code talks to an instance only through the [`QueryExecutor`]
//! trait. [`SqlxExecutor`] is the live implementation; the `testing` feature
//! adds a scripted one. All statement text comes from [`QueryCatalog`].

pub mod catalog;
pub mod error;
pub mod executor;
pub mod pool;
pub mod row;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use catalog::QueryCatalog;
pub use error::DbError;
pub use executor::{Connector, QueryExecutor};
pub use pool::{SqlxConnector, SqlxExecutor};
pub use row::{Row, SqlValue};
