//! Per-instance cleanup counters.

use std::ops::AddAssign;

use serde::Serialize;

/// What a cleanup run removed from one instance.
///
/// Each operation returns its own delta; the orchestrator merges deltas into
/// the instance's accumulator with `+=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanResults {
    pub trace_files_removed: u64,
    pub backup_files_removed: u64,
    pub backup_bytes_removed: u64,
    pub alerts_removed: u64,
    pub log_segments_removed: u64,
    pub log_segment_bytes_removed: u64,
    pub audit_entries_removed: u64,
    pub data_volume_bytes_removed: u64,
    pub total_disk_bytes_removed: u64,
}

impl CleanResults {
    /// True when nothing was removed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for CleanResults {
    fn add_assign(&mut self, rhs: Self) {
        self.trace_files_removed += rhs.trace_files_removed;
        self.backup_files_removed += rhs.backup_files_removed;
        self.backup_bytes_removed += rhs.backup_bytes_removed;
        self.alerts_removed += rhs.alerts_removed;
        self.log_segments_removed += rhs.log_segments_removed;
        self.log_segment_bytes_removed += rhs.log_segment_bytes_removed;
        self.audit_entries_removed += rhs.audit_entries_removed;
        self.data_volume_bytes_removed += rhs.data_volume_bytes_removed;
        self.total_disk_bytes_removed += rhs.total_disk_bytes_removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(CleanResults::default().is_empty());
    }

    #[test]
    fn add_assign_is_additive() {
        let mut acc = CleanResults {
            alerts_removed: 5,
            total_disk_bytes_removed: 100,
            ..Default::default()
        };
        acc += CleanResults {
            alerts_removed: 250,
            trace_files_removed: 2,
            total_disk_bytes_removed: 50,
            ..Default::default()
        };
        assert_eq!(acc.alerts_removed, 255);
        assert_eq!(acc.trace_files_removed, 2);
        assert_eq!(acc.total_disk_bytes_removed, 150);
        assert!(!acc.is_empty());
    }
}
