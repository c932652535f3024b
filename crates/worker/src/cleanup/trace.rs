//! Trace file removal.
//!
//! Failures are item-scoped: a file that cannot be removed, or is still
//! listed after removal (usually because it is open), is logged and skipped.

use hcc_core::types::{format_bytes, TraceFile};
use hcc_core::{Category, CleanResults};
use hcc_db::{DbError, QueryCatalog, Row};

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::Trace;

fn trace_file(row: &Row) -> Result<TraceFile, DbError> {
    Ok(TraceFile {
        host: row.text(0)?,
        file_name: row.text(1)?,
        size_bytes: row.unsigned(2)?,
        last_modified: row.text(3)?,
    })
}

impl Cleaner<'_> {
    /// Remove closed trace files older than `retain_days`.
    pub async fn clean_trace_files(&self, retain_days: u32) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "trace file removal");

        if retain_days == 0 {
            self.info(CATEGORY, "RetainTraceDays is set to zero, nothing to do");
            return Ok(CleanResults::default());
        }

        let files = self
            .query(CATEGORY, &QueryCatalog::trace_files(retain_days))
            .await
            .and_then(|rows| rows.iter().map(trace_file).collect::<Result<Vec<_>, _>>())
            .map_err(|e| CleanupError::operation("Failed to list trace files", e))?;

        let files: Vec<TraceFile> = files.into_iter().filter(TraceFile::has_trace_suffix).collect();
        if files.is_empty() {
            self.info(CATEGORY, "No trace files meet the criteria for removal");
            return Ok(CleanResults::default());
        }

        if self.is_dry_run() {
            let bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
            self.info(
                CATEGORY,
                format!(
                    "Would remove {} trace files totalling {}",
                    files.len(),
                    format_bytes(bytes)
                ),
            );
            return Ok(CleanResults::default());
        }

        let mut removed = 0u64;
        let mut saved = 0u64;
        for file in &files {
            if self.remove_one(file).await {
                removed += 1;
                saved += file.size_bytes;
            }
        }

        if removed > 0 {
            self.info(
                CATEGORY,
                format!("Removed {removed} old trace files saving {}", format_bytes(saved)),
            );
        }

        Ok(CleanResults {
            trace_files_removed: removed,
            total_disk_bytes_removed: saved,
            ..Default::default()
        })
    }

    /// Remove one file and confirm it is gone. Returns whether it counts as
    /// removed.
    async fn remove_one(&self, file: &TraceFile) -> bool {
        let sql = QueryCatalog::remove_trace(&file.host, &file.file_name);
        if let Err(e) = self.exec(CATEGORY, &sql).await {
            self.info(
                CATEGORY,
                format!(
                    "The trace file '{}' on host '{}' could not be removed: {e}",
                    file.file_name, file.host
                ),
            );
            return false;
        }

        let remaining = self
            .query_row(CATEGORY, &QueryCatalog::trace_present(&file.file_name))
            .await
            .and_then(|row| row.unsigned(0));
        match remaining {
            Ok(0) => true,
            Ok(_) => {
                self.info(
                    CATEGORY,
                    format!(
                        "The trace file '{}' on host '{}' is still present, it may be open. \
                         This will be retried next time",
                        file.file_name, file.host
                    ),
                );
                false
            }
            Err(e) => {
                self.info(
                    CATEGORY,
                    format!(
                        "Could not verify removal of trace file '{}': {e}",
                        file.file_name
                    ),
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hcc_db::testing::{row, ScriptedExecutor};
    use hcc_db::SqlValue;

    use super::super::test_support::*;
    use super::*;

    fn file_row(host: &str, name: &str, size: i64) -> Row {
        row([
            SqlValue::from(host),
            name.into(),
            size.into(),
            "2024-01-01 00:00:00".into(),
        ])
    }

    fn removal(exec: &ScriptedExecutor, host: &str, name: &str, remaining: i64) {
        exec.expect_exec(QueryCatalog::remove_trace(host, name), 0)
            .expect_query(QueryCatalog::trace_present(name), vec![row([remaining])]);
    }

    #[tokio::test]
    async fn removed_files_are_counted_with_their_size() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(
            QueryCatalog::trace_files(14),
            vec![
                file_row("h1", "a.trc", 1000),
                file_row("h2", "b.gz", 500),
            ],
        );
        removal(&exec, "h1", "a.trc", 0);
        removal(&exec, "h2", "b.gz", 0);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(14)
            .await
            .unwrap();
        assert_eq!(r.trace_files_removed, 2);
        assert_eq!(r.total_disk_bytes_removed, 1500);
        exec.assert_done();
    }

    #[tokio::test]
    async fn file_still_present_is_not_counted_and_not_an_error() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(
            QueryCatalog::trace_files(14),
            vec![file_row("h1", "open.trc", 1000), file_row("h1", "closed.trc", 10)],
        );
        removal(&exec, "h1", "open.trc", 1);
        removal(&exec, "h1", "closed.trc", 0);
        let (sink, mut capture) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(14)
            .await
            .unwrap();
        assert_eq!(r.trace_files_removed, 1);
        assert_eq!(r.total_disk_bytes_removed, 10);
        assert!(messages(&capture.drain())
            .iter()
            .any(|m| m.contains("'open.trc'") && m.contains("still present")));
    }

    #[tokio::test]
    async fn failed_removal_continues_with_next_file() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(
            QueryCatalog::trace_files(14),
            vec![file_row("h1", "a.trc", 1), file_row("h1", "b.trc", 2)],
        )
        .expect_exec_error(
            QueryCatalog::remove_trace("h1", "a.trc"),
            DbError::Driver("file is locked".into()),
        );
        removal(&exec, "h1", "b.trc", 0);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(14)
            .await
            .unwrap();
        assert_eq!(r.trace_files_removed, 1);
        exec.assert_done();
    }

    #[tokio::test]
    async fn failed_verification_is_not_counted() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::trace_files(14), vec![file_row("h1", "a.trc", 1)])
            .expect_exec(QueryCatalog::remove_trace("h1", "a.trc"), 0)
            .expect_query(QueryCatalog::trace_present("a.trc"), vec![]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(14)
            .await
            .unwrap();
        assert!(r.is_empty());
    }

    #[tokio::test]
    async fn empty_candidate_set_is_a_no_op() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::trace_files(7), vec![]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(7)
            .await
            .unwrap();
        assert!(r.is_empty());
        assert!(exec.executed().is_empty());
    }

    #[tokio::test]
    async fn files_without_trace_suffix_are_ignored() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::trace_files(7), vec![file_row("h1", "nameserver.ini", 5)]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(7)
            .await
            .unwrap();
        assert!(r.is_empty());
        exec.assert_done();
    }

    #[tokio::test]
    async fn zero_retention_does_nothing() {
        let exec = ScriptedExecutor::new();
        let (sink, mut capture) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(0)
            .await
            .unwrap();
        assert!(r.is_empty());
        assert!(exec.statements().is_empty());
        assert!(messages(&capture.drain()).contains(&"RetainTraceDays is set to zero, nothing to do"));
    }

    #[tokio::test]
    async fn dry_run_issues_no_removal() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(
            QueryCatalog::trace_files(14),
            vec![file_row("h1", "a.trc", 1), file_row("h1", "b.trc", 2)],
        );
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", true)
            .clean_trace_files(14)
            .await
            .unwrap();
        assert!(r.is_empty());
        assert!(exec.executed().is_empty());
        exec.assert_done();
    }

    #[tokio::test]
    async fn listing_failure_fails_the_operation() {
        let exec = ScriptedExecutor::new();
        exec.expect_query_error(QueryCatalog::trace_files(14), DbError::Driver("down".into()));
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_trace_files(14)
            .await;
        assert_matches!(r, Err(CleanupError::Operation { .. }));
    }
}
