//! Statement text for every query and command issued during a run.
//!
//! Values are interpolated into the text because several of the targeted
//! statements (`ALTER SYSTEM ...`, `BACKUP CATALOG ...`) do not accept bind
//! parameters. String literals go through [`quote`].

use hcc_core::privilege::Privilege;
use hcc_core::types::{DEFRAG_TARGET_PERCENT, TRACE_SUFFIXES};

/// Builds statement text.
pub struct QueryCatalog;

impl QueryCatalog {
    /// Server version probe. Returns one row with one text column.
    pub const VERSION: &'static str = r#"SELECT VERSION FROM "SYS"."M_DATABASE""#;

    /// Free log segments. Returns `COUNT, BYTES`.
    pub const FREE_LOG_SEGMENTS: &'static str =
        "SELECT COUNT(STATE) AS COUNT, COALESCE(SUM(TOTAL_SIZE), 0) AS BYTES \
         FROM SYS.M_LOG_SEGMENTS WHERE STATE = 'Free'";

    pub const RECLAIM_LOG: &'static str = "ALTER SYSTEM RECLAIM LOG";

    /// Data volumes. Returns `HOST, PORT, USED_SIZE, TOTAL_SIZE` per volume.
    pub const DATA_VOLUMES: &'static str =
        "SELECT HOST, PORT, USED_SIZE, TOTAL_SIZE FROM SYS.M_VOLUME_FILES WHERE FILE_TYPE = 'DATA'";

    /// Effective grant state for every [`Privilege`] held by `username`.
    ///
    /// Returns one `(KEY, 'TRUE' | 'FALSE')` row per privilege.
    pub fn privileges(username: &str) -> String {
        let user = quote(&username.to_uppercase());
        Privilege::ALL
            .iter()
            .map(|p| {
                let (view, predicate) = grant_predicate(*p);
                format!(
                    "SELECT '{key}' AS PRIVILEGE, CASE WHEN COUNT(*) > 0 THEN 'TRUE' ELSE 'FALSE' END AS GRANTED \
                     FROM \"SYS\".\"{view}\" WHERE USER_NAME = {user} AND {predicate}",
                    key = p.key(),
                )
            })
            .collect::<Vec<_>>()
            .join(" UNION ALL ")
    }

    /// Trace files older than `days` with a removable suffix.
    ///
    /// Returns `HOST, FILE_NAME, FILE_SIZE, FILE_MTIME` per file.
    pub fn trace_files(days: u32) -> String {
        // Same rule as `TraceFile::has_trace_suffix`: the dot is part of the match.
        let suffixes = TRACE_SUFFIXES
            .iter()
            .map(|suffix| {
                let dotted = format!(".{suffix}");
                format!("RIGHT(FILE_NAME, {}) = {}", dotted.len(), quote(&dotted))
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        format!(
            "SELECT HOST, FILE_NAME, FILE_SIZE, TO_VARCHAR(FILE_MTIME) AS FILE_MTIME \
             FROM \"SYS\".\"M_TRACEFILES\" \
             WHERE FILE_MTIME < ADD_DAYS(NOW(), -{days}) \
             AND ({suffixes})"
        )
    }

    pub fn remove_trace(host: &str, file_name: &str) -> String {
        format!(
            "ALTER SYSTEM REMOVE TRACES({}, {})",
            quote(host),
            quote(file_name)
        )
    }

    /// Whether a trace file is still listed. Returns `TRACE` (a count).
    pub fn trace_present(file_name: &str) -> String {
        format!(
            "SELECT COUNT(FILE_NAME) AS TRACE FROM \"SYS\".\"M_TRACEFILES\" WHERE FILE_NAME = {}",
            quote(file_name)
        )
    }

    /// Newest successful full data backup older than `days`. Returns `BACKUP_ID`.
    pub fn latest_full_backup(days: u32) -> String {
        format!(
            "SELECT BACKUP_ID FROM \"SYS\".\"M_BACKUP_CATALOG\" \
             WHERE STATE_NAME = 'successful' AND ENTRY_TYPE_NAME = 'complete data backup' \
             AND SYS_END_TIME < (SELECT ADD_DAYS(NOW(), -{days}) FROM DUMMY) \
             ORDER BY SYS_END_TIME DESC LIMIT 1"
        )
    }

    /// Catalog entries older than `backup_id`, grouped by entry type.
    ///
    /// Returns `ENTRY_TYPE_NAME, FILE_COUNT, BYTES` per group.
    pub fn backup_summary(backup_id: &str) -> String {
        format!(
            "SELECT B.ENTRY_TYPE_NAME, COUNT(F.BACKUP_ID) AS FILE_COUNT, \
             COALESCE(SUM(F.BACKUP_SIZE), 0) AS BYTES \
             FROM \"SYS\".\"M_BACKUP_CATALOG\" AS B \
             LEFT JOIN \"SYS\".\"M_BACKUP_CATALOG_FILES\" AS F ON B.BACKUP_ID = F.BACKUP_ID \
             WHERE B.BACKUP_ID < {backup_id} \
             GROUP BY B.ENTRY_TYPE_NAME"
        )
    }

    /// Truncate the catalog before `backup_id`; `complete` also deletes the
    /// physical files.
    pub fn delete_backups(backup_id: &str, complete: bool) -> String {
        let mut sql = format!("BACKUP CATALOG DELETE ALL BEFORE BACKUP_ID {backup_id}");
        if complete {
            sql.push_str(" COMPLETE");
        }
        sql
    }

    /// Alerts older than `days`. Returns `COUNT`.
    pub fn alert_count(days: u32) -> String {
        format!(
            "SELECT COUNT(SNAPSHOT_ID) AS COUNT FROM \"_SYS_STATISTICS\".\"STATISTICS_ALERTS_BASE\" \
             WHERE ALERT_TIMESTAMP < ADD_DAYS(NOW(), -{days})"
        )
    }

    pub fn delete_alerts(days: u32) -> String {
        format!(
            "DELETE FROM \"_SYS_STATISTICS\".\"STATISTICS_ALERTS_BASE\" \
             WHERE ALERT_TIMESTAMP < ADD_DAYS(NOW(), -{days})"
        )
    }

    /// Audit entries older than `days`. Returns `COUNT`.
    pub fn audit_count(days: u32) -> String {
        format!(
            "SELECT COUNT(TIMESTAMP) AS COUNT FROM \"SYS\".\"AUDIT_LOG\" \
             WHERE TIMESTAMP < (SELECT ADD_DAYS(NOW(), -{days}) FROM DUMMY)"
        )
    }

    /// Server-side timestamp `days` in the past. Returns `NOW` as text,
    /// `YYYY-MM-DD HH:MM:SS.fffffff`.
    pub fn audit_cutoff(days: u32) -> String {
        format!("SELECT TO_VARCHAR(ADD_DAYS(NOW(), -{days})) AS NOW FROM DUMMY")
    }

    pub fn truncate_audit(until: &str) -> String {
        format!("ALTER SYSTEM CLEAR AUDIT LOG UNTIL {}", quote(until))
    }

    pub fn defragment(host: &str, port: u16) -> String {
        format!(
            "ALTER SYSTEM RECLAIM DATAVOLUME '{}:{port}' {DEFRAG_TARGET_PERCENT} DEFRAGMENT",
            host.replace('\'', "''")
        )
    }

    /// Current total size of one data volume. Returns `TOTAL_SIZE`.
    pub fn data_volume_size(host: &str, port: u16) -> String {
        format!(
            "SELECT TOTAL_SIZE FROM SYS.M_VOLUME_FILES \
             WHERE FILE_TYPE = 'DATA' AND HOST = {} AND PORT = {port}",
            quote(host)
        )
    }
}

/// View and filter that identify a grant of `privilege`.
fn grant_predicate(privilege: Privilege) -> (&'static str, &'static str) {
    match privilege {
        Privilege::Monitoring => ("EFFECTIVE_ROLES", "ROLE_NAME = 'MONITORING'"),
        Privilege::TraceAdmin => ("EFFECTIVE_PRIVILEGES", "PRIVILEGE = 'TRACE ADMIN'"),
        Privilege::BackupAdmin => ("EFFECTIVE_PRIVILEGES", "PRIVILEGE = 'BACKUP ADMIN'"),
        Privilege::LogAdmin => ("EFFECTIVE_PRIVILEGES", "PRIVILEGE = 'LOG ADMIN'"),
        Privilege::AuditOperator => ("EFFECTIVE_PRIVILEGES", "PRIVILEGE = 'AUDIT OPERATOR'"),
        Privilege::ResourceAdmin => ("EFFECTIVE_PRIVILEGES", "PRIVILEGE = 'RESOURCE ADMIN'"),
        // Schema-level grants on _SYS_STATISTICS also cover the table.
        Privilege::SelectAlerts => (
            "EFFECTIVE_PRIVILEGES",
            "PRIVILEGE = 'SELECT' AND SCHEMA_NAME = '_SYS_STATISTICS' \
             AND (OBJECT_NAME = 'STATISTICS_ALERTS_BASE' OR OBJECT_TYPE = 'SCHEMA')",
        ),
        Privilege::DeleteAlerts => (
            "EFFECTIVE_PRIVILEGES",
            "PRIVILEGE = 'DELETE' AND SCHEMA_NAME = '_SYS_STATISTICS' \
             AND (OBJECT_NAME = 'STATISTICS_ALERTS_BASE' OR OBJECT_TYPE = 'SCHEMA')",
        ),
    }
}

/// Render `value` as a single-quoted SQL string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
