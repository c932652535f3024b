//! Audit log truncation.

use hcc_core::{Category, CleanResults};
use hcc_db::QueryCatalog;

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::Audit;

/// Strip the fractional seconds from a server timestamp.
///
/// `2024-03-01 10:15:42.1234560` becomes `2024-03-01 10:15:42`. Anything that
/// does not split into exactly two parts on `.` is rejected.
pub fn second_precision(timestamp: &str) -> Result<&str, CleanupError> {
    let parts: Vec<&str> = timestamp.split('.').collect();
    match parts.as_slice() {
        [seconds, _fraction] => Ok(*seconds),
        _ => Err(CleanupError::Format {
            value: timestamp.to_string(),
            parts: parts.len(),
        }),
    }
}

impl Cleaner<'_> {
    /// Clear audit log entries older than `retain_days`.
    ///
    /// The cutoff is computed by the server so it matches the server clock the
    /// audit timestamps were written with.
    pub async fn clean_audit_log(&self, retain_days: u32) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "audit log truncation");

        let count = self
            .query_row(CATEGORY, &QueryCatalog::audit_count(retain_days))
            .await
            .and_then(|row| row.unsigned(0))
            .map_err(|e| CleanupError::operation("Failed to count old audit entries", e))?;

        if count == 0 {
            self.info(CATEGORY, "No audit entries meet the criteria for removal");
            return Ok(CleanResults::default());
        }

        let cutoff = self
            .query_row(CATEGORY, &QueryCatalog::audit_cutoff(retain_days))
            .await
            .and_then(|row| row.text(0))
            .map_err(|e| CleanupError::operation("Failed to read the server time", e))?;
        let until = second_precision(&cutoff)?;

        self.info(
            CATEGORY,
            format!("Will remove {count} audit entries recorded before {until}"),
        );

        if self.is_dry_run() {
            return Ok(CleanResults::default());
        }

        self.exec(CATEGORY, &QueryCatalog::truncate_audit(until))
            .await
            .map_err(|e| CleanupError::operation("Failed to truncate the audit log", e))?;
        self.info(CATEGORY, format!("Removed {count} audit entries"));

        Ok(CleanResults {
            audit_entries_removed: count,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hcc_db::testing::{row, ScriptedExecutor};

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn fractional_seconds_are_stripped() {
        assert_eq!(
            second_precision("2024-03-01 10:15:42.1234560").unwrap(),
            "2024-03-01 10:15:42"
        );
    }

    #[test]
    fn timestamps_without_exactly_one_separator_are_rejected() {
        assert_matches!(
            second_precision("2024-03-01 10:15:42"),
            Err(CleanupError::Format { parts: 1, .. })
        );
        assert_matches!(
            second_precision("2024.03.01 10:15:42.1"),
            Err(CleanupError::Format { parts: 4, .. })
        );
    }

    #[tokio::test]
    async fn truncates_until_server_cutoff() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::audit_count(60), vec![row([12i64])])
            .expect_query(
                QueryCatalog::audit_cutoff(60),
                vec![row(["2024-03-01 10:15:42.1234560"])],
            )
            .expect_exec(QueryCatalog::truncate_audit("2024-03-01 10:15:42"), 0);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_audit_log(60)
            .await
            .unwrap();
        assert_eq!(r.audit_entries_removed, 12);
        exec.assert_done();
    }

    #[tokio::test]
    async fn bad_timestamp_is_a_format_error_and_nothing_is_truncated() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::audit_count(60), vec![row([12i64])])
            .expect_query(QueryCatalog::audit_cutoff(60), vec![row(["2024-03-01 10:15:42"])]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_audit_log(60)
            .await;
        assert_matches!(r, Err(CleanupError::Format { .. }));
        assert!(exec.executed().is_empty());
        exec.assert_done();
    }

    #[tokio::test]
    async fn zero_matching_rows_is_a_no_op() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::audit_count(60), vec![row([0i64])]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_audit_log(60)
            .await
            .unwrap();
        assert!(r.is_empty());
        exec.assert_done();
    }

    #[tokio::test]
    async fn dry_run_skips_truncation() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::audit_count(60), vec![row([12i64])])
            .expect_query(
                QueryCatalog::audit_cutoff(60),
                vec![row(["2024-03-01 10:15:42.1234560"])],
            );
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", true)
            .clean_audit_log(60)
            .await
            .unwrap();
        assert!(r.is_empty());
        assert!(exec.executed().is_empty());
    }
}
