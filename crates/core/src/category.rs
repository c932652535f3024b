//! The six maintenance categories and their fixed execution order.

use std::fmt;

use serde::Serialize;

/// One maintenance domain that can be enabled per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Trace,
    Backup,
    Alert,
    Log,
    Audit,
    DataVolume,
}

impl Category {
    /// Every category in the order the orchestrator runs them.
    pub const ALL: [Category; 6] = [
        Category::Trace,
        Category::Backup,
        Category::Alert,
        Category::Log,
        Category::Audit,
        Category::DataVolume,
    ];

    /// Name of the configuration flag that enables this category.
    pub fn flag_name(&self) -> &'static str {
        match self {
            Category::Trace => "CleanTrace",
            Category::Backup => "CleanBackupCatalog",
            Category::Alert => "CleanAlerts",
            Category::Log => "CleanLogVolume",
            Category::Audit => "CleanAudit",
            Category::DataVolume => "CleanDataVolume",
        }
    }

    /// Name used as the event source suffix for this category's operation.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Category::Trace => "CleanTraceFiles",
            Category::Backup => "CleanBackupCatalog",
            Category::Alert => "CleanAlerts",
            Category::Log => "CleanLogVolume",
            Category::Audit => "CleanAuditLog",
            Category::DataVolume => "CleanDataVolume",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_order_is_fixed() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.flag_name()).collect();
        assert_eq!(
            names,
            vec![
                "CleanTrace",
                "CleanBackupCatalog",
                "CleanAlerts",
                "CleanLogVolume",
                "CleanAudit",
                "CleanDataVolume",
            ]
        );
    }
}
