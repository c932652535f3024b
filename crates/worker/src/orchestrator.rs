//! Sequential processing of every configured instance.
//!
//! Each instance goes through credential lookup, connect, version probe and
//! privilege gate. A failure in any of these skips the instance. After that
//! the six operations run in [`Category::ALL`] order; an operation failure is
//! recorded and the next operation still runs.

use std::sync::Arc;

use hcc_core::{Category, Config, DbConfig};
use hcc_db::{Connector, QueryCatalog, QueryExecutor};
use hcc_events::EventSink;

use crate::cleanup::Cleaner;
use crate::instance::{resolve_password, InstanceError, InstanceReport, OperationStatus};
use crate::privileges::check_privileges;

/// Event source for run-level messages.
pub const SOURCE: &str = "HCC";

type PasswordLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Drives a housekeeping run over all configured instances.
pub struct Orchestrator<'a> {
    connector: &'a dyn Connector,
    sink: EventSink,
    dry_run: bool,
    password_lookup: PasswordLookup,
}

impl<'a> Orchestrator<'a> {
    pub fn new(connector: &'a dyn Connector, sink: EventSink, dry_run: bool) -> Self {
        Self {
            connector,
            sink,
            dry_run,
            password_lookup: Box::new(|var| std::env::var(var).ok()),
        }
    }

    /// Replace the environment lookup used for `HCC_<Name>` passwords.
    pub fn with_password_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.password_lookup = Box::new(lookup);
        self
    }

    /// Process every instance in configuration order.
    pub async fn run(&self, config: &Config) -> Vec<InstanceReport> {
        let mut reports = Vec::with_capacity(config.databases.len());
        for db in &config.databases {
            reports.push(self.process(db).await);
        }

        let skipped = reports.iter().filter(|r| r.is_skipped()).count();
        let with_failures = reports.iter().filter(|r| r.has_failures()).count();
        self.sink.info(
            SOURCE,
            format!(
                "Processed {} databases: {} completed, {} skipped, {} with failed operations",
                reports.len(),
                reports.len() - skipped,
                skipped,
                with_failures
            ),
        );
        reports
    }

    /// Process one instance.
    pub async fn process(&self, db: &DbConfig) -> InstanceReport {
        tracing::debug!(instance = %db.name, dry_run = self.dry_run, "Processing instance");
        let mut report = InstanceReport::new(db);

        let exec = match self.prepare(db).await {
            Ok(exec) => exec,
            Err(err) => {
                self.sink.info(
                    db.name.as_str(),
                    format!("{err}. Cannot process any tasks for this database"),
                );
                report.skipped = Some(err.to_string());
                return report;
            }
        };

        let cleaner = Cleaner::new(exec.as_ref(), &self.sink, &db.name, self.dry_run);
        for category in Category::ALL {
            let status = if !db.is_enabled(category) {
                self.sink.info(
                    db.name.as_str(),
                    format!("{category} not enabled for this database"),
                );
                OperationStatus::NotEnabled
            } else {
                match cleaner.run(category, &db.settings).await {
                    Ok(delta) => {
                        report.results += delta;
                        OperationStatus::Succeeded
                    }
                    Err(err) => {
                        if let Some(partial) = err.partial() {
                            report.results += partial;
                        }
                        self.sink.info(
                            db.name.as_str(),
                            format!(
                                "An error occurred in {}: {err}",
                                category.operation_name()
                            ),
                        );
                        OperationStatus::Failed(err.to_string())
                    }
                }
            };
            report.operations.push((category, status));
        }

        report
    }

    /// Credential, connection, version probe and privilege gate.
    async fn prepare(&self, db: &DbConfig) -> Result<Arc<dyn QueryExecutor>, InstanceError> {
        let password = resolve_password(db, |var| (self.password_lookup)(var))?;

        self.sink
            .verbose(db.name.as_str(), format!("Connecting to {}", db.redacted_dsn()));
        let exec = self
            .connector
            .connect(db, &password)
            .await
            .map_err(|source| InstanceError::Connection {
                dsn: db.redacted_dsn(),
                source,
            })?;

        let version = exec
            .query_row(QueryCatalog::VERSION)
            .await
            .and_then(|row| row.text(0))
            .map_err(InstanceError::Version)?;
        self.sink
            .info(db.name.as_str(), format!("HANA version found {version}"));

        check_privileges(exec.as_ref(), db).await?;
        self.sink
            .verbose(db.name.as_str(), "Privilege check passed");

        Ok(exec)
    }
}
