//! Privilege requirements for the maintenance categories.
//!
//! The privilege query returns one `(key, "TRUE" | "FALSE")` row per entry of
//! [`Privilege::ALL`]. [`PrivilegeMap::check`] then verifies that the
//! response is complete, that `MONITORING` is granted, and that every enabled
//! category has its privileges.

use std::collections::HashMap;

use serde::Serialize;

use crate::category::Category;
use crate::config::DbConfig;
use crate::error::PrivilegeError;

/// A grant the connecting user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Privilege {
    Monitoring,
    TraceAdmin,
    BackupAdmin,
    LogAdmin,
    AuditOperator,
    ResourceAdmin,
    SelectAlerts,
    DeleteAlerts,
}

impl Privilege {
    /// Every key the privilege query must return.
    pub const ALL: [Privilege; 8] = [
        Privilege::Monitoring,
        Privilege::TraceAdmin,
        Privilege::BackupAdmin,
        Privilege::LogAdmin,
        Privilege::AuditOperator,
        Privilege::ResourceAdmin,
        Privilege::SelectAlerts,
        Privilege::DeleteAlerts,
    ];

    /// Key as returned by the privilege query.
    pub fn key(&self) -> &'static str {
        match self {
            Privilege::Monitoring => "MONITORING",
            Privilege::TraceAdmin => "TRACE_ADMIN",
            Privilege::BackupAdmin => "BACKUP_ADMIN",
            Privilege::LogAdmin => "LOG_ADMIN",
            Privilege::AuditOperator => "AUDIT_OPERATOR",
            Privilege::ResourceAdmin => "RESOURCE_ADMIN",
            Privilege::SelectAlerts => "SELECT_STATISTICS_ALERTS_BASE",
            Privilege::DeleteAlerts => "DELETE_STATISTICS_ALERTS_BASE",
        }
    }

    /// Human-readable description used in error messages.
    pub fn description(&self) -> &'static str {
        match self {
            Privilege::Monitoring => "role 'MONITORING'",
            Privilege::TraceAdmin => "system privilege 'TRACE ADMIN'",
            Privilege::BackupAdmin => "system privilege 'BACKUP ADMIN'",
            Privilege::LogAdmin => "system privilege 'LOG ADMIN'",
            Privilege::AuditOperator => "system privilege 'AUDIT OPERATOR'",
            Privilege::ResourceAdmin => "system privilege 'RESOURCE ADMIN'",
            Privilege::SelectAlerts => {
                "SELECT privilege on \"_SYS_STATISTICS\".\"STATISTICS_ALERTS_BASE\""
            }
            Privilege::DeleteAlerts => {
                "DELETE privilege on \"_SYS_STATISTICS\".\"STATISTICS_ALERTS_BASE\""
            }
        }
    }
}

impl Category {
    /// Privileges needed on top of `MONITORING` to run this category.
    pub fn required_privileges(&self) -> &'static [Privilege] {
        match self {
            Category::Trace => &[Privilege::TraceAdmin],
            Category::Backup => &[Privilege::BackupAdmin],
            Category::Alert => &[Privilege::SelectAlerts, Privilege::DeleteAlerts],
            Category::Log => &[Privilege::LogAdmin],
            Category::Audit => &[Privilege::AuditOperator],
            Category::DataVolume => &[Privilege::ResourceAdmin],
        }
    }
}

/// Grants reported by the server for the connecting user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrivilegeMap {
    grants: HashMap<String, bool>,
}

impl PrivilegeMap {
    /// Build the map from `(key, value)` rows.
    ///
    /// Values other than `TRUE`/`FALSE` mean the server answered in an
    /// unexpected shape and are rejected.
    pub fn from_rows<I, K, V>(rows: I) -> Result<Self, PrivilegeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut grants = HashMap::new();
        for (key, value) in rows {
            let key = key.into();
            let granted = match value.as_ref() {
                "TRUE" => true,
                "FALSE" => false,
                other => {
                    return Err(PrivilegeError::UnexpectedValue {
                        key,
                        value: other.to_string(),
                    })
                }
            };
            grants.insert(key, granted);
        }
        Ok(Self { grants })
    }

    /// Whether `privilege` was reported as granted.
    pub fn is_granted(&self, privilege: Privilege) -> bool {
        self.grants.get(privilege.key()).copied().unwrap_or(false)
    }

    /// Verify the grants against what `db` has enabled.
    pub fn check(&self, db: &DbConfig) -> Result<(), PrivilegeError> {
        for privilege in Privilege::ALL {
            if !self.grants.contains_key(privilege.key()) {
                return Err(PrivilegeError::MissingKey(privilege.key()));
            }
        }

        if !self.is_granted(Privilege::Monitoring) {
            return Err(PrivilegeError::MonitoringNotGranted {
                user: db.username.clone(),
            });
        }

        for category in db.settings.enabled_categories() {
            for &privilege in category.required_privileges() {
                if !self.is_granted(privilege) {
                    return Err(PrivilegeError::NotGranted {
                        privilege,
                        category,
                        user: db.username.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
