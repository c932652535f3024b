use std::path::PathBuf;

use crate::category::Category;
use crate::privilege::Privilege;

/// Fatal errors raised while resolving the configuration document.
///
/// Any of these aborts the whole run before a connection is opened.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Required field '{field}' is missing")]
    Missing { field: String },

    #[error("Field '{field}' must be {expected}")]
    Mistyped {
        field: String,
        expected: &'static str,
    },

    #[error("Field '{field}' is invalid: {source}")]
    Invalid {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Field '{field}' must be 0 or higher, got {value}")]
    Negative { field: String, value: i64 },

    #[error("Field '{field}' is out of range: {value}")]
    OutOfRange { field: String, value: i64 },
}

/// Two configured instances share the same `Name`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("The database name '{0}' occurs more than once in the configuration, each database name must be unique")]
pub struct DuplicateNameError(pub String);

/// The connecting principal does not satisfy the privilege requirements.
///
/// Scoped to one instance: the run continues with the next one.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrivilegeError {
    #[error("Privilege check returned '{value}' for {key}, only 'TRUE' or 'FALSE' is expected")]
    UnexpectedValue { key: String, value: String },

    #[error("Expected key {0} is missing from the privilege map")]
    MissingKey(&'static str),

    #[error("The required role 'MONITORING' has not been granted to the user {user}")]
    MonitoringNotGranted { user: String },

    #[error("The {} is required for {category} but has not been granted to the user {user}", .privilege.description())]
    NotGranted {
        privilege: Privilege,
        category: Category,
        user: String,
    },
}
