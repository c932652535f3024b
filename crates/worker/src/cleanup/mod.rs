//! The six cleanup operations.
//!
//! Each operation runs against one instance through a [`Cleaner`] and returns
//! the [`CleanResults`] delta it produced. Nothing is mutated in place; the
//! caller merges deltas into the instance total.

pub mod alert;
pub mod audit;
pub mod backup;
pub mod data_volume;
pub mod log_volume;
pub mod trace;

use hcc_core::{Category, CleanResults, Settings};
use hcc_db::{DbError, QueryExecutor};
use hcc_events::EventSink;

/// Why an operation did not complete.
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// A query or statement failed and the operation was abandoned.
    #[error("{context}: {source}")]
    Operation {
        context: String,
        #[source]
        source: DbError,
    },

    /// Some items failed while the rest were processed. `partial` holds what
    /// the successful items removed.
    #[error("{failed} item(s) could not be cleaned")]
    ItemFailures { failed: usize, partial: CleanResults },

    /// The server returned a timestamp in an unexpected shape.
    #[error("Unexpected timestamp format '{value}', expected 2 parts but found {parts}")]
    Format { value: String, parts: usize },
}

impl CleanupError {
    pub(crate) fn operation(context: impl Into<String>, source: DbError) -> Self {
        CleanupError::Operation {
            context: context.into(),
            source,
        }
    }

    /// Results that were achieved before the failure, if any.
    pub fn partial(&self) -> Option<CleanResults> {
        match self {
            CleanupError::ItemFailures { partial, .. } => Some(*partial),
            _ => None,
        }
    }
}

/// Context shared by the operations of one instance.
pub struct Cleaner<'a> {
    exec: &'a dyn QueryExecutor,
    sink: &'a EventSink,
    instance: &'a str,
    dry_run: bool,
}

impl<'a> Cleaner<'a> {
    pub fn new(
        exec: &'a dyn QueryExecutor,
        sink: &'a EventSink,
        instance: &'a str,
        dry_run: bool,
    ) -> Self {
        Self {
            exec,
            sink,
            instance,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run the operation for `category` with the thresholds in `settings`.
    pub async fn run(
        &self,
        category: Category,
        settings: &Settings,
    ) -> Result<CleanResults, CleanupError> {
        match category {
            Category::Trace => self.clean_trace_files(settings.retain_trace_days).await,
            Category::Backup => {
                self.clean_backup_catalog(
                    settings.retain_backup_catalog_days,
                    settings.delete_old_backups,
                )
                .await
            }
            Category::Alert => self.clean_alerts(settings.retain_alerts_days).await,
            Category::Log => self.clean_log_volume().await,
            Category::Audit => self.clean_audit_log(settings.retain_audit_days).await,
            Category::DataVolume => self.clean_data_volume().await,
        }
    }

    fn source(&self, category: Category) -> String {
        format!("{}:{}", self.instance, category.operation_name())
    }

    fn info(&self, category: Category, message: impl Into<String>) {
        self.sink.info(self.source(category), message);
    }

    fn verbose(&self, category: Category, message: impl Into<String>) {
        self.sink.verbose(self.source(category), message);
    }

    /// Announce the operation and, under dry run, that nothing will change.
    fn begin(&self, category: Category, what: &str) {
        self.verbose(category, format!("Attempting {what}"));
        if self.dry_run {
            self.verbose(category, "Dry run enabled, no changes will be made");
        }
    }

    async fn query(
        &self,
        category: Category,
        sql: &str,
    ) -> Result<Vec<hcc_db::Row>, DbError> {
        self.verbose(category, format!("Attempting query '{sql}'"));
        self.exec.query(sql).await
    }

    async fn query_row(&self, category: Category, sql: &str) -> Result<hcc_db::Row, DbError> {
        self.verbose(category, format!("Attempting query '{sql}'"));
        self.exec.query_row(sql).await
    }

    /// Issue a mutating statement. Never called under dry run.
    async fn exec(&self, category: Category, sql: &str) -> Result<u64, DbError> {
        debug_assert!(!self.dry_run, "mutating statement issued during dry run");
        self.verbose(category, format!("Attempting statement '{sql}'"));
        self.exec.exec(sql).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use hcc_core::Settings;
    use hcc_events::{EventCapture, EventSink, LogEvent};

    pub fn settings() -> Settings {
        Settings {
            clean_trace: true,
            retain_trace_days: 14,
            clean_backup_catalog: true,
            retain_backup_catalog_days: 30,
            delete_old_backups: false,
            clean_alerts: true,
            retain_alerts_days: 14,
            clean_log_volume: true,
            clean_audit: true,
            retain_audit_days: 60,
            clean_data_volume: true,
        }
    }

    pub fn sink() -> (EventSink, EventCapture) {
        EventSink::capture()
    }

    pub fn messages(events: &[LogEvent]) -> Vec<&str> {
        events.iter().map(|e| e.message.as_str()).collect()
    }
}
