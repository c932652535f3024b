//! Raw schema of the JSON configuration document.
//!
//! Every field is optional at this layer and wrapped in [`Typed`], so that
//! presence and type rules are enforced by the validation pass in
//! [`resolve`](super::resolve), which can name the offending field. Numbers
//! are signed so negative values survive parsing and are rejected explicitly.
//! Unknown keys are rejected so a misspelt override cannot silently fall back
//! to the root value.

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

/// A field that either parsed as `T` or held a value of some other type.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Typed<T> {
    Valid(T),
    Mistyped(IgnoredAny),
}

/// Root object of the configuration document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RawConfig {
    pub clean_trace: Option<Typed<bool>>,
    pub retain_trace_days: Option<Typed<i64>>,
    pub clean_backup_catalog: Option<Typed<bool>>,
    pub retain_backup_catalog_days: Option<Typed<i64>>,
    pub delete_old_backups: Option<Typed<bool>>,
    pub clean_alerts: Option<Typed<bool>>,
    pub retain_alerts_days: Option<Typed<i64>>,
    pub clean_log_volume: Option<Typed<bool>>,
    pub clean_audit: Option<Typed<bool>>,
    pub retain_audit_days: Option<Typed<i64>>,
    pub clean_data_volume: Option<Typed<bool>>,
    pub databases: Option<Typed<Vec<Value>>>,
}

/// One entry of the `Databases` array.
///
/// Entries are read as raw values first and converted one at a time so a bad
/// entry can be reported by its index.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct RawDbConfig {
    pub name: Option<Typed<String>>,
    pub hostname: Option<Typed<String>>,
    pub port: Option<Typed<i64>>,
    pub username: Option<Typed<String>>,
    pub password: Option<Typed<String>>,

    pub clean_trace: Option<Typed<bool>>,
    pub retain_trace_days: Option<Typed<i64>>,
    pub clean_backup_catalog: Option<Typed<bool>>,
    pub retain_backup_catalog_days: Option<Typed<i64>>,
    pub delete_old_backups: Option<Typed<bool>>,
    pub clean_alerts: Option<Typed<bool>>,
    pub retain_alerts_days: Option<Typed<i64>>,
    pub clean_log_volume: Option<Typed<bool>>,
    pub clean_audit: Option<Typed<bool>>,
    pub retain_audit_days: Option<Typed<i64>>,
    pub clean_data_volume: Option<Typed<bool>>,
}
