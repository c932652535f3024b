//! Backup catalog truncation.

use hcc_core::types::{format_bytes, BackupFileSummary};
use hcc_core::{Category, CleanResults};
use hcc_db::{DbError, QueryCatalog, Row};

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::Backup;

fn summary(row: &Row) -> Result<BackupFileSummary, DbError> {
    Ok(BackupFileSummary {
        entry_type: row.text(0)?,
        file_count: row.unsigned(1)?,
        bytes: row.unsigned(2)?,
    })
}

impl Cleaner<'_> {
    /// Truncate catalog entries preceding the newest full backup older than
    /// `retain_days`. With `delete_files` the backup files are removed too.
    pub async fn clean_backup_catalog(
        &self,
        retain_days: u32,
        delete_files: bool,
    ) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "backup catalog truncation");

        let backup_id = match self
            .query_row(CATEGORY, &QueryCatalog::latest_full_backup(retain_days))
            .await
        {
            Ok(row) => row
                .text(0)
                .map_err(|e| CleanupError::operation("Failed to read backup ID", e))?,
            Err(DbError::NoRows) => {
                self.info(CATEGORY, "No backup ID found which matches the criteria");
                return Ok(CleanResults::default());
            }
            Err(e) => return Err(CleanupError::operation("Failed to find latest full backup", e)),
        };
        self.info(
            CATEGORY,
            format!("Found backup ID {backup_id} which meets the criteria"),
        );

        let summaries = self
            .query(CATEGORY, &QueryCatalog::backup_summary(&backup_id))
            .await
            .and_then(|rows| rows.iter().map(summary).collect::<Result<Vec<_>, _>>())
            .map_err(|e| {
                CleanupError::operation("Failed to retrieve backup catalog entries to remove", e)
            })?;

        if summaries.is_empty() {
            self.info(CATEGORY, format!("Nothing to delete older than {backup_id}"));
            return Ok(CleanResults::default());
        }

        for s in &summaries {
            let message = if delete_files {
                format!(
                    "Will remove {} {} files from the catalog, this will free {}",
                    s.file_count,
                    s.entry_type,
                    format_bytes(s.bytes)
                )
            } else {
                format!(
                    "Will remove {} {} files from the catalog",
                    s.file_count, s.entry_type
                )
            };
            self.info(CATEGORY, message);
        }

        if self.is_dry_run() {
            return Ok(CleanResults::default());
        }

        self.exec(CATEGORY, &QueryCatalog::delete_backups(&backup_id, delete_files))
            .await
            .map_err(|e| CleanupError::operation("Failed to truncate the backup catalog", e))?;
        self.info(CATEGORY, "Backup catalog successfully truncated");

        let files: u64 = summaries.iter().map(|s| s.file_count).sum();
        let bytes: u64 = if delete_files {
            summaries.iter().map(|s| s.bytes).sum()
        } else {
            0
        };
        Ok(CleanResults {
            backup_files_removed: files,
            backup_bytes_removed: bytes,
            total_disk_bytes_removed: bytes,
            ..Default::default()
        })
    }
}
