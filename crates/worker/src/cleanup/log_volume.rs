//! Free log segment reclamation.

use hcc_core::types::format_bytes;
use hcc_core::{Category, CleanResults};
use hcc_db::QueryCatalog;

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::Log;

impl Cleaner<'_> {
    /// Reclaim free log segments.
    ///
    /// The reclaim statement is issued even when no segment is free. Counters
    /// come from the pre-reclaim query.
    pub async fn clean_log_volume(&self) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "log segment reclamation");

        let row = self
            .query_row(CATEGORY, QueryCatalog::FREE_LOG_SEGMENTS)
            .await
            .map_err(|e| CleanupError::operation("Failed to query free log segments", e))?;
        let (segments, bytes) = row
            .unsigned(0)
            .and_then(|count| Ok((count, row.unsigned(1)?)))
            .map_err(|e| CleanupError::operation("Failed to read free log segments", e))?;

        self.info(
            CATEGORY,
            format!(
                "Found {segments} free log segments totalling {}",
                format_bytes(bytes)
            ),
        );

        if self.is_dry_run() {
            return Ok(CleanResults::default());
        }

        self.exec(CATEGORY, QueryCatalog::RECLAIM_LOG)
            .await
            .map_err(|e| CleanupError::operation("Failed to reclaim the log volume", e))?;
        self.info(CATEGORY, "Log volume successfully reclaimed");

        Ok(CleanResults {
            log_segments_removed: segments,
            log_segment_bytes_removed: bytes,
            total_disk_bytes_removed: bytes,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hcc_db::testing::{row, ScriptedExecutor};
    use hcc_db::DbError;

    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn reclaim_reports_pre_reclaim_counts() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::FREE_LOG_SEGMENTS, vec![row([4i64, 4096])])
            .expect_exec(QueryCatalog::RECLAIM_LOG, 0);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_log_volume()
            .await
            .unwrap();
        assert_eq!(r.log_segments_removed, 4);
        assert_eq!(r.log_segment_bytes_removed, 4096);
        assert_eq!(r.total_disk_bytes_removed, 4096);
        exec.assert_done();
    }

    #[tokio::test]
    async fn zero_free_segments_still_reclaims() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::FREE_LOG_SEGMENTS, vec![row([0i64, 0])])
            .expect_exec(QueryCatalog::RECLAIM_LOG, 0);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false)
            .clean_log_volume()
            .await
            .unwrap();
        assert!(r.is_empty());
        assert_eq!(exec.executed(), vec![QueryCatalog::RECLAIM_LOG.to_string()]);
    }

    #[tokio::test]
    async fn reclaim_failure_is_an_operation_error() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::FREE_LOG_SEGMENTS, vec![row([1i64, 10])])
            .expect_exec_error(QueryCatalog::RECLAIM_LOG, DbError::Driver("busy".into()));
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", false).clean_log_volume().await;
        assert_matches!(r, Err(CleanupError::Operation { .. }));
    }

    #[tokio::test]
    async fn dry_run_skips_reclaim() {
        let exec = ScriptedExecutor::new();
        exec.expect_query(QueryCatalog::FREE_LOG_SEGMENTS, vec![row([4i64, 4096])]);
        let (sink, _c) = sink();

        let r = Cleaner::new(&exec, &sink, "PRD", true)
            .clean_log_volume()
            .await
            .unwrap();
        assert!(r.is_empty());
        exec.assert_done();
    }
}
