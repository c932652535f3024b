//! Per-instance cleaning report.

use std::fmt::Write as _;

use hcc_core::types::format_bytes;
use hcc_events::EventSink;

use crate::instance::InstanceReport;

const NOT_ENABLED: &str = "Not Enabled";

/// Render the report for one instance.
pub fn render(report: &InstanceReport) -> String {
    let s = &report.settings;
    let r = &report.results;
    let mut out = format!("{}: Cleaning Report\n", report.name);

    if let Some(reason) = &report.skipped {
        let _ = writeln!(out, "Skipped:                  {reason}");
        return out;
    }

    let line = |out: &mut String, label: &str, value: Option<String>| {
        let value = value.unwrap_or_else(|| NOT_ENABLED.to_string());
        let _ = writeln!(out, "{:<26}{value}", format!("{label}:"));
    };

    line(
        &mut out,
        "Trace files removed",
        s.clean_trace.then(|| r.trace_files_removed.to_string()),
    );
    line(
        &mut out,
        "Backup files removed",
        s.clean_backup_catalog
            .then(|| r.backup_files_removed.to_string()),
    );
    line(
        &mut out,
        "Backup data removed",
        (s.clean_backup_catalog && s.delete_old_backups)
            .then(|| format_bytes(r.backup_bytes_removed)),
    );
    line(
        &mut out,
        "Alert entries removed",
        s.clean_alerts.then(|| r.alerts_removed.to_string()),
    );
    line(
        &mut out,
        "Audit entries removed",
        s.clean_audit.then(|| r.audit_entries_removed.to_string()),
    );
    line(
        &mut out,
        "Log segments removed",
        s.clean_log_volume.then(|| r.log_segments_removed.to_string()),
    );
    line(
        &mut out,
        "Log segments reduced by",
        s.clean_log_volume
            .then(|| format_bytes(r.log_segment_bytes_removed)),
    );
    line(
        &mut out,
        "Data volume reduced by",
        s.clean_data_volume
            .then(|| format_bytes(r.data_volume_bytes_removed)),
    );
    line(
        &mut out,
        "Total disk space freed",
        Some(format_bytes(r.total_disk_bytes_removed)),
    );
    out
}

/// Publish every report, unless this was a dry run.
pub fn publish(reports: &[InstanceReport], sink: &EventSink, dry_run: bool) {
    if dry_run {
        sink.verbose(
            crate::orchestrator::SOURCE,
            "Dry run enabled, cleaning reports suppressed",
        );
        return;
    }
    for report in reports {
        sink.info(report.name.as_str(), render(report));
    }
}
