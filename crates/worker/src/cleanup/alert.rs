//! Statistics server alert purge.

use hcc_core::{Category, CleanResults};
use hcc_db::QueryCatalog;

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::Alert;

impl Cleaner<'_> {
    /// Delete alerts older than `retain_days`.
    ///
    /// The reported count is the count taken before the delete.
    pub async fn clean_alerts(&self, retain_days: u32) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "alert removal");

        let count = self
            .query_row(CATEGORY, &QueryCatalog::alert_count(retain_days))
            .await
            .and_then(|row| row.unsigned(0))
            .map_err(|e| CleanupError::operation("Failed to count old alerts", e))?;

        if count == 0 {
            self.info(CATEGORY, "No alerts meet the criteria for removal");
            return Ok(CleanResults::default());
        }
        self.info(
            CATEGORY,
            format!("Found {count} alerts older than {retain_days} days"),
        );

        if self.is_dry_run() {
            return Ok(CleanResults::default());
        }

        self.exec(CATEGORY, &QueryCatalog::delete_alerts(retain_days))
            .await
            .map_err(|e| CleanupError::operation("Failed to delete old alerts", e))?;
        self.info(CATEGORY, format!("Removed {count} old alerts"));

        Ok(CleanResults {
            alerts_removed: count,
            ..Default::default()
        })
    }
}
