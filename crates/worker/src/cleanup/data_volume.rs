//! Data volume defragmentation.
//!
//! Failures are item-scoped: a volume that fails to defragment is counted and
//! the remaining volumes are still processed.

use hcc_core::types::{format_bytes, DataVolume};
use hcc_core::{Category, CleanResults};
use hcc_db::{DbError, QueryCatalog, Row};

use super::{Cleaner, CleanupError};

const CATEGORY: Category = Category::DataVolume;

fn data_volume(row: &Row) -> Result<DataVolume, DbError> {
    Ok(DataVolume {
        host: row.text(0)?,
        port: row.port(1)?,
        used_bytes: row.unsigned(2)?,
        total_bytes: row.unsigned(3)?,
    })
}

impl Cleaner<'_> {
    /// Defragment every data volume that is more than half empty.
    ///
    /// Returns [`CleanupError::ItemFailures`] if any volume failed; the error
    /// still carries the bytes reclaimed from the volumes that succeeded.
    pub async fn clean_data_volume(&self) -> Result<CleanResults, CleanupError> {
        self.begin(CATEGORY, "data volume defragmentation");

        let volumes = self
            .query(CATEGORY, QueryCatalog::DATA_VOLUMES)
            .await
            .and_then(|rows| rows.iter().map(data_volume).collect::<Result<Vec<_>, _>>())
            .map_err(|e| CleanupError::operation("Failed to list data volumes", e))?;

        if volumes.is_empty() {
            self.info(CATEGORY, "No data volumes found");
            return Ok(CleanResults::default());
        }

        let mut saved = 0u64;
        let mut failed = 0usize;
        for volume in volumes.iter().filter(|v| v.needs_defrag()) {
            self.info(
                CATEGORY,
                format!(
                    "Data volume {}:{} uses {} of {}, defragmentation required",
                    volume.host,
                    volume.port,
                    format_bytes(volume.used_bytes),
                    format_bytes(volume.total_bytes)
                ),
            );
            if self.is_dry_run() {
                continue;
            }

            let sql = QueryCatalog::defragment(&volume.host, volume.port);
            if let Err(e) = self.exec(CATEGORY, &sql).await {
                failed += 1;
                self.info(
                    CATEGORY,
                    format!(
                        "Failed to defragment data volume {}:{}: {e}",
                        volume.host, volume.port
                    ),
                );
                continue;
            }
            saved += self.bytes_reclaimed(volume).await;
        }

        if saved > 0 {
            self.info(
                CATEGORY,
                format!("Defragmentation reclaimed {}", format_bytes(saved)),
            );
        }

        let results = CleanResults {
            data_volume_bytes_removed: saved,
            total_disk_bytes_removed: saved,
            ..Default::default()
        };
        if failed > 0 {
            return Err(CleanupError::ItemFailures {
                failed,
                partial: results,
            });
        }
        Ok(results)
    }

    /// Re-read the volume size after defragmentation. A failed read only
    /// costs precision, so it is logged and counted as zero.
    async fn bytes_reclaimed(&self, volume: &DataVolume) -> u64 {
        let size = self
            .query_row(
                CATEGORY,
                &QueryCatalog::data_volume_size(&volume.host, volume.port),
            )
            .await
            .and_then(|row| row.unsigned(0));
        match size {
            Ok(new_total) => volume.total_bytes.saturating_sub(new_total),
            Err(e) => {
                self.info(
                    CATEGORY,
                    format!(
                        "Could not determine space reclaimed on {}:{}: {e}",
                        volume.host, volume.port
                    ),
                );
                0
            }
        }
    }
}
