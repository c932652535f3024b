//! Validation pass turning the raw document into a resolved [`Config`].
//!
//! Rules:
//! - every root field must be present; there are no implicit root defaults;
//! - `Name`, `Hostname`, `Port` and `Username` must be present on every
//!   instance, and a bad instance disqualifies the whole document;
//! - `Password` is optional and is sourced from the environment later;
//! - every other instance field overrides the root value when present and
//!   inherits it when absent;
//! - every present field must have the expected JSON type; a mistyped field
//!   is reported by its path, e.g. `Databases[0].Port`;
//! - numeric fields must be non-negative; negatives are rejected, not clamped.
//!
//! Every decision is reported on the event sink before returning.

use std::fmt::Display;
use std::path::Path;

use hcc_events::EventSink;
use serde_json::Value;

use super::schema::{RawConfig, RawDbConfig, Typed};
use super::{Config, DbConfig, Settings, PASSWORD_ENV_PREFIX};
use crate::error::ConfigError;

/// Event source for configuration diagnostics.
pub const SOURCE: &str = "HccConfig";

/// Read and resolve the configuration file at `path`.
pub fn load_from_file(path: &Path, sink: &EventSink) -> Result<Config, ConfigError> {
    let document = std::fs::read_to_string(path).map_err(|source| {
        reject(
            sink,
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;
    resolve(&document, sink)
}

/// Resolve a configuration document.
pub fn resolve(document: &str, sink: &EventSink) -> Result<Config, ConfigError> {
    let raw: RawConfig =
        serde_json::from_str(document).map_err(|e| reject(sink, ConfigError::Parse(e)))?;

    let settings = resolve_root(&raw, sink)?;

    let entries = required(
        typed(raw.databases, "Databases", "an array", sink)?,
        "Databases",
        sink,
    )?;
    let databases = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| resolve_db(index, entry, &settings, sink))
        .collect::<Result<Vec<_>, _>>()?;

    sink.verbose(
        SOURCE,
        format!("Found a valid config for {} databases", databases.len()),
    );

    Ok(Config {
        settings,
        databases,
    })
}

fn resolve_root(raw: &RawConfig, sink: &EventSink) -> Result<Settings, ConfigError> {
    Ok(Settings {
        clean_trace: required_flag(raw.clean_trace, "CleanTrace", sink)?,
        retain_trace_days: required_days(raw.retain_trace_days, "RetainTraceDays", sink)?,
        clean_backup_catalog: required_flag(
            raw.clean_backup_catalog,
            "CleanBackupCatalog",
            sink,
        )?,
        retain_backup_catalog_days: required_days(
            raw.retain_backup_catalog_days,
            "RetainBackupCatalogDays",
            sink,
        )?,
        delete_old_backups: required_flag(raw.delete_old_backups, "DeleteOldBackups", sink)?,
        clean_alerts: required_flag(raw.clean_alerts, "CleanAlerts", sink)?,
        retain_alerts_days: required_days(raw.retain_alerts_days, "RetainAlertsDays", sink)?,
        clean_log_volume: required_flag(raw.clean_log_volume, "CleanLogVolume", sink)?,
        clean_audit: required_flag(raw.clean_audit, "CleanAudit", sink)?,
        retain_audit_days: required_days(raw.retain_audit_days, "RetainAuditDays", sink)?,
        clean_data_volume: required_flag(raw.clean_data_volume, "CleanDataVolume", sink)?,
    })
}

fn resolve_db(
    index: usize,
    entry: Value,
    root: &Settings,
    sink: &EventSink,
) -> Result<DbConfig, ConfigError> {
    let field = |name: &str| format!("Databases[{index}].{name}");

    if !entry.is_object() {
        return Err(mistyped(&format!("Databases[{index}]"), "an object", sink));
    }
    let raw: RawDbConfig = serde_json::from_value(entry).map_err(|source| {
        reject(
            sink,
            ConfigError::Invalid {
                field: format!("Databases[{index}]"),
                source,
            },
        )
    })?;

    let name = required(text(raw.name, &field("Name"), sink)?, &field("Name"), sink)?;
    let hostname = required(
        text(raw.hostname, &field("Hostname"), sink)?,
        &field("Hostname"),
        sink,
    )?;
    let port = required(number(raw.port, &field("Port"), sink)?, &field("Port"), sink)?;
    let port = to_port(port, &field("Port"), sink)?;
    let username = required(
        text(raw.username, &field("Username"), sink)?,
        &field("Username"),
        sink,
    )?;
    let password = text(raw.password, &field("Password"), sink)?;

    if password.is_none() {
        sink.info(
            SOURCE,
            format!(
                "No 'Password' for DB config {index}, the password will be sourced from the environment variable '{PASSWORD_ENV_PREFIX}{name}'"
            ),
        );
    }

    let settings = Settings {
        clean_trace: inherit_flag(raw.clean_trace, root.clean_trace, &field("CleanTrace"), sink)?,
        retain_trace_days: inherit_days(
            raw.retain_trace_days,
            root.retain_trace_days,
            &field("RetainTraceDays"),
            sink,
        )?,
        clean_backup_catalog: inherit_flag(
            raw.clean_backup_catalog,
            root.clean_backup_catalog,
            &field("CleanBackupCatalog"),
            sink,
        )?,
        retain_backup_catalog_days: inherit_days(
            raw.retain_backup_catalog_days,
            root.retain_backup_catalog_days,
            &field("RetainBackupCatalogDays"),
            sink,
        )?,
        delete_old_backups: inherit_flag(
            raw.delete_old_backups,
            root.delete_old_backups,
            &field("DeleteOldBackups"),
            sink,
        )?,
        clean_alerts: inherit_flag(
            raw.clean_alerts,
            root.clean_alerts,
            &field("CleanAlerts"),
            sink,
        )?,
        retain_alerts_days: inherit_days(
            raw.retain_alerts_days,
            root.retain_alerts_days,
            &field("RetainAlertsDays"),
            sink,
        )?,
        clean_log_volume: inherit_flag(
            raw.clean_log_volume,
            root.clean_log_volume,
            &field("CleanLogVolume"),
            sink,
        )?,
        clean_audit: inherit_flag(raw.clean_audit, root.clean_audit, &field("CleanAudit"), sink)?,
        retain_audit_days: inherit_days(
            raw.retain_audit_days,
            root.retain_audit_days,
            &field("RetainAuditDays"),
            sink,
        )?,
        clean_data_volume: inherit_flag(
            raw.clean_data_volume,
            root.clean_data_volume,
            &field("CleanDataVolume"),
            sink,
        )?,
    };

    Ok(DbConfig {
        name,
        hostname,
        port,
        username,
        password,
        settings,
    })
}

// ---------------------------------------------------------------------------
// Field types
// ---------------------------------------------------------------------------

fn typed<T>(
    value: Option<Typed<T>>,
    field: &str,
    expected: &'static str,
    sink: &EventSink,
) -> Result<Option<T>, ConfigError> {
    match value {
        None => Ok(None),
        Some(Typed::Valid(v)) => Ok(Some(v)),
        Some(Typed::Mistyped(_)) => Err(mistyped(field, expected, sink)),
    }
}

fn flag(
    value: Option<Typed<bool>>,
    field: &str,
    sink: &EventSink,
) -> Result<Option<bool>, ConfigError> {
    typed(value, field, "true or false", sink)
}

/// Whole numbers only: `14.5` and `"14"` are both rejected.
fn number(
    value: Option<Typed<i64>>,
    field: &str,
    sink: &EventSink,
) -> Result<Option<i64>, ConfigError> {
    typed(value, field, "a whole number", sink)
}

fn text(
    value: Option<Typed<String>>,
    field: &str,
    sink: &EventSink,
) -> Result<Option<String>, ConfigError> {
    typed(value, field, "a string", sink)
}

fn mistyped(field: &str, expected: &'static str, sink: &EventSink) -> ConfigError {
    reject(
        sink,
        ConfigError::Mistyped {
            field: field.to_string(),
            expected,
        },
    )
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn required<T>(value: Option<T>, field: &str, sink: &EventSink) -> Result<T, ConfigError> {
    value.ok_or_else(|| {
        reject(
            sink,
            ConfigError::Missing {
                field: field.to_string(),
            },
        )
    })
}

fn required_flag(
    value: Option<Typed<bool>>,
    field: &str,
    sink: &EventSink,
) -> Result<bool, ConfigError> {
    required(flag(value, field, sink)?, field, sink)
}

fn required_days(
    value: Option<Typed<i64>>,
    field: &str,
    sink: &EventSink,
) -> Result<u32, ConfigError> {
    let value = required(number(value, field, sink)?, field, sink)?;
    to_days(value, field, sink)
}

fn inherit<T: Display + Copy>(value: Option<T>, root: T, field: &str, sink: &EventSink) -> T {
    match value {
        Some(v) => v,
        None => {
            sink.verbose(
                SOURCE,
                format!("'{field}' not set, inheriting {root} from root config"),
            );
            root
        }
    }
}

fn inherit_flag(
    value: Option<Typed<bool>>,
    root: bool,
    field: &str,
    sink: &EventSink,
) -> Result<bool, ConfigError> {
    Ok(inherit(flag(value, field, sink)?, root, field, sink))
}

fn inherit_days(
    value: Option<Typed<i64>>,
    root: u32,
    field: &str,
    sink: &EventSink,
) -> Result<u32, ConfigError> {
    match number(value, field, sink)? {
        Some(v) => to_days(v, field, sink),
        None => Ok(inherit(None, root, field, sink)),
    }
}

fn to_days(value: i64, field: &str, sink: &EventSink) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(reject(
            sink,
            ConfigError::Negative {
                field: field.to_string(),
                value,
            },
        ));
    }
    u32::try_from(value).map_err(|_| {
        reject(
            sink,
            ConfigError::OutOfRange {
                field: field.to_string(),
                value,
            },
        )
    })
}

fn to_port(value: i64, field: &str, sink: &EventSink) -> Result<u16, ConfigError> {
    if value < 0 {
        return Err(reject(
            sink,
            ConfigError::Negative {
                field: field.to_string(),
                value,
            },
        ));
    }
    u16::try_from(value).map_err(|_| {
        reject(
            sink,
            ConfigError::OutOfRange {
                field: field.to_string(),
                value,
            },
        )
    })
}

/// Report a fatal validation failure and hand the error back.
fn reject(sink: &EventSink, err: ConfigError) -> ConfigError {
    sink.info(SOURCE, format!("{err}. Cannot continue"));
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn root() -> serde_json::Value {
        json!({
            "CleanTrace": true,
            "RetainTraceDays": 14,
            "CleanBackupCatalog": true,
            "RetainBackupCatalogDays": 30,
            "DeleteOldBackups": false,
            "CleanAlerts": true,
            "RetainAlertsDays": 14,
            "CleanLogVolume": false,
            "CleanAudit": true,
            "RetainAuditDays": 60,
            "CleanDataVolume": false,
            "Databases": [
                {
                    "Name": "SYSTEMDB@PRD",
                    "Hostname": "hanadb.mydomain.int",
                    "Port": 30015,
                    "Username": "hcc",
                    "Password": "secret"
                }
            ]
        })
    }

    fn run(doc: &serde_json::Value) -> (Result<Config, ConfigError>, Vec<hcc_events::LogEvent>) {
        let (sink, mut capture) = EventSink::capture();
        let result = resolve(&doc.to_string(), &sink);
        (result, capture.drain())
    }

    #[test]
    fn resolves_complete_document() {
        let (result, _) = run(&root());
        let cfg = result.unwrap();
        assert!(cfg.settings.clean_trace);
        assert_eq!(cfg.settings.retain_audit_days, 60);
        assert_eq!(cfg.databases.len(), 1);
        let db = &cfg.databases[0];
        assert_eq!(db.name, "SYSTEMDB@PRD");
        assert_eq!(db.port, 30015);
        assert_eq!(db.password.as_deref(), Some("secret"));
        assert_eq!(db.settings, cfg.settings);
    }

    #[test]
    fn instance_override_wins_over_root() {
        let mut doc = root();
        doc["Databases"][0]["RetainTraceDays"] = json!(3);
        doc["Databases"][0]["CleanLogVolume"] = json!(true);

        let cfg = run(&doc).0.unwrap();
        assert_eq!(cfg.databases[0].settings.retain_trace_days, 3);
        assert!(cfg.databases[0].settings.clean_log_volume);
        assert_eq!(cfg.settings.retain_trace_days, 14);
    }

    #[test]
    fn inherited_fields_emit_verbose_events() {
        let (result, events) = run(&root());
        assert!(result.is_ok());
        let inherited: Vec<_> = events
            .iter()
            .filter(|e| e.message.contains("inheriting"))
            .collect();
        assert_eq!(inherited.len(), 11);
        assert!(inherited.iter().all(|e| e.verbose && e.source == SOURCE));
    }

    #[test]
    fn missing_root_field_is_fatal() {
        let mut doc = root();
        doc.as_object_mut().unwrap().remove("RetainAlertsDays");

        let (result, events) = run(&doc);
        assert_matches!(result, Err(ConfigError::Missing { field }) if field == "RetainAlertsDays");
        assert!(events
            .iter()
            .any(|e| !e.verbose && e.message.contains("RetainAlertsDays")));
    }

    #[test]
    fn missing_databases_is_fatal() {
        let mut doc = root();
        doc.as_object_mut().unwrap().remove("Databases");
        assert_matches!(run(&doc).0, Err(ConfigError::Missing { field }) if field == "Databases");
    }

    #[test]
    fn mistyped_root_field_is_fatal() {
        let mut doc = root();
        doc["CleanTrace"] = json!("yes");

        let (result, events) = run(&doc);
        assert_matches!(
            result,
            Err(ConfigError::Mistyped { field, expected: "true or false" }) if field == "CleanTrace"
        );
        assert!(events
            .iter()
            .any(|e| !e.verbose && e.message.contains("'CleanTrace'")));
    }

    #[test]
    fn fractional_threshold_is_mistyped() {
        let mut doc = root();
        doc["RetainAlertsDays"] = json!(14.5);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Mistyped { field, expected: "a whole number" }) if field == "RetainAlertsDays"
        );
    }

    #[test]
    fn mistyped_instance_field_names_its_path() {
        let mut doc = root();
        doc["Databases"][0]["Port"] = json!("30015");

        let (result, events) = run(&doc);
        assert_matches!(
            result,
            Err(ConfigError::Mistyped { field, .. }) if field == "Databases[0].Port"
        );
        assert!(events
            .iter()
            .any(|e| e.message.contains("'Databases[0].Port'")));

        let mut doc = root();
        doc["Databases"][0]["CleanAudit"] = json!(1);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Mistyped { field, .. }) if field == "Databases[0].CleanAudit"
        );
    }

    #[test]
    fn non_array_databases_is_mistyped() {
        let mut doc = root();
        doc["Databases"] = json!({ "Name": "PRD" });
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Mistyped { field, expected: "an array" }) if field == "Databases"
        );

        let mut doc = root();
        doc["Databases"] = json!(["PRD"]);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Mistyped { field, expected: "an object" }) if field == "Databases[0]"
        );
    }

    #[test]
    fn null_instance_field_is_inherited() {
        let mut doc = root();
        doc["Databases"][0]["RetainTraceDays"] = json!(null);
        let cfg = run(&doc).0.unwrap();
        assert_eq!(cfg.databases[0].settings.retain_trace_days, 14);
    }

    #[test]
    fn negative_root_threshold_is_fatal() {
        let mut doc = root();
        doc["RetainTraceDays"] = json!(-1);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Negative { field, value: -1 }) if field == "RetainTraceDays"
        );
    }

    #[test]
    fn negative_instance_threshold_is_fatal_not_inherited() {
        let mut doc = root();
        doc["Databases"][0]["RetainAuditDays"] = json!(-7);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Negative { field, value: -7 }) if field == "Databases[0].RetainAuditDays"
        );
    }

    #[test]
    fn missing_instance_identity_is_fatal() {
        for key in ["Name", "Hostname", "Port", "Username"] {
            let mut doc = root();
            doc["Databases"][0].as_object_mut().unwrap().remove(key);
            let expected = format!("Databases[0].{key}");
            assert_matches!(
                run(&doc).0,
                Err(ConfigError::Missing { field }) if field == expected,
                "removing {key}"
            );
        }
    }

    #[test]
    fn port_out_of_range_is_fatal() {
        let mut doc = root();
        doc["Databases"][0]["Port"] = json!(70000);
        assert_matches!(run(&doc).0, Err(ConfigError::OutOfRange { value: 70000, .. }));

        doc["Databases"][0]["Port"] = json!(-1);
        assert_matches!(run(&doc).0, Err(ConfigError::Negative { value: -1, .. }));
    }

    #[test]
    fn missing_password_is_allowed_and_reported() {
        let mut doc = root();
        doc["Databases"][0].as_object_mut().unwrap().remove("Password");

        let (result, events) = run(&doc);
        assert_eq!(result.unwrap().databases[0].password, None);
        assert!(events
            .iter()
            .any(|e| e.message.contains("HCC_SYSTEMDB@PRD")));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut doc = root();
        doc["Databases"][0]["RetainTraceDay"] = json!(3);
        assert_matches!(
            run(&doc).0,
            Err(ConfigError::Invalid { field, .. }) if field == "Databases[0]"
        );

        let mut doc = root();
        doc["RetainTraceDay"] = json!(3);
        assert_matches!(run(&doc).0, Err(ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let (sink, _capture) = EventSink::capture();
        assert_matches!(resolve("{ not json", &sink), Err(ConfigError::Parse(_)));
    }

    #[test]
    fn zero_thresholds_are_valid() {
        let mut doc = root();
        doc["RetainTraceDays"] = json!(0);
        doc["Databases"][0]["RetainBackupCatalogDays"] = json!(0);
        let cfg = run(&doc).0.unwrap();
        assert_eq!(cfg.settings.retain_trace_days, 0);
        assert_eq!(cfg.databases[0].settings.retain_backup_catalog_days, 0);
    }
}
