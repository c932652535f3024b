//! `hcc-worker` -- runs housekeeping across the configured instances.
//!
//! The `hcc` binary wires these pieces together: resolve the configuration,
//! process each instance through the [`Orchestrator`], then publish the
//! per-instance reports.

pub mod cleanup;
pub mod cli;
pub mod instance;
pub mod orchestrator;
pub mod privileges;
pub mod report;

pub use cleanup::{Cleaner, CleanupError};
pub use instance::{InstanceError, InstanceReport, OperationStatus};
pub use orchestrator::Orchestrator;
