//! Entities read back from the database during a single operation.
//!
//! None of these outlive the operation that queried them.

use serde::Serialize;

/// File-name suffixes considered safe for trace housekeeping.
pub const TRACE_SUFFIXES: &[&str] = &["trc", "gz"];

/// Share of used space below which a data volume is defragmented.
pub const DEFRAG_USED_RATIO: f64 = 0.5;

/// Compaction target passed to the defragmentation command (percent).
pub const DEFRAG_TARGET_PERCENT: u32 = 120;

/// A trace file on one host of the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFile {
    pub host: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub last_modified: String,
}

impl TraceFile {
    /// Whether the file name ends in a recognised trace suffix.
    pub fn has_trace_suffix(&self) -> bool {
        TRACE_SUFFIXES
            .iter()
            .any(|suffix| self.file_name.ends_with(&format!(".{suffix}")))
    }
}

/// Backup catalog entries of one type that precede the retained full backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFileSummary {
    pub entry_type: String,
    pub file_count: u64,
    pub bytes: u64,
}

/// Space usage of one data volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataVolume {
    pub host: String,
    pub port: u16,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl DataVolume {
    /// A volume needs defragmentation when more than half of it is whitespace.
    pub fn needs_defrag(&self) -> bool {
        if self.total_bytes == 0 {
            return false;
        }
        (self.used_bytes as f64 / self.total_bytes as f64) < DEFRAG_USED_RATIO
    }
}

/// Human-readable byte formatting.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    const TIB: f64 = GIB * 1024.0;

    let b = bytes as f64;
    if b >= TIB {
        format!("{:.2} TiB", b / TIB)
    } else if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.2} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.2} KiB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}
