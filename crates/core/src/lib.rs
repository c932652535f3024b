//! `hcc-core` -- domain logic for database fleet housekeeping.
//!
//! No database access happens here. The crate resolves and validates the
//! configuration document, defines the cleanup result counters and the
//! entities read back during cleanup, and evaluates privilege requirements.

pub mod category;
pub mod config;
pub mod error;
pub mod privilege;
pub mod results;
pub mod types;

pub use category::Category;
pub use config::{Config, DbConfig, Settings};
pub use results::CleanResults;
