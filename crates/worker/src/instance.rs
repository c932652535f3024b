//! Per-instance outcome types and credential sourcing.

use hcc_core::error::PrivilegeError;
use hcc_core::{Category, CleanResults, DbConfig, Settings};
use hcc_db::DbError;

/// Why an instance was skipped before any cleanup ran.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("No password for this database in the configuration or in environment variable {var}")]
    Credential { var: String },

    #[error("Could not connect to {dsn}: {source}")]
    Connection {
        dsn: String,
        #[source]
        source: DbError,
    },

    #[error("Could not get the version of the database: {0}")]
    Version(#[source] DbError),

    #[error("Could not query the privileges of the connecting user: {0}")]
    PrivilegeQuery(#[source] DbError),

    #[error(transparent)]
    Privilege(#[from] PrivilegeError),
}

/// Resolve the password for `db`.
///
/// A configured password wins; otherwise `HCC_<Name>` is read through
/// `lookup`. Empty values count as absent.
pub fn resolve_password<F>(db: &DbConfig, lookup: F) -> Result<String, InstanceError>
where
    F: FnOnce(&str) -> Option<String>,
{
    if let Some(password) = db.configured_password() {
        return Ok(password.to_string());
    }
    let var = db.password_env_var();
    match lookup(&var) {
        Some(password) if !password.is_empty() => Ok(password),
        _ => Err(InstanceError::Credential { var }),
    }
}

/// How one operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Succeeded,
    Failed(String),
    NotEnabled,
}

/// Everything recorded while processing one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceReport {
    pub name: String,
    pub settings: Settings,
    /// Set when the instance was skipped before cleanup.
    pub skipped: Option<String>,
    pub results: CleanResults,
    pub operations: Vec<(Category, OperationStatus)>,
}

impl InstanceReport {
    pub fn new(db: &DbConfig) -> Self {
        Self {
            name: db.name.clone(),
            settings: db.settings,
            skipped: None,
            results: CleanResults::default(),
            operations: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    pub fn has_failures(&self) -> bool {
        self.operations
            .iter()
            .any(|(_, status)| matches!(status, OperationStatus::Failed(_)))
    }

    pub fn status(&self, category: Category) -> Option<&OperationStatus> {
        self.operations
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, s)| s)
    }
}
