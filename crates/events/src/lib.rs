//! `hcc-events` -- operator event stream for housekeeping runs.
//!
//! Producers hold a cloneable [`EventSink`]; a single background task owned
//! by [`EventLogger`] drains the stream in FIFO order and renders events
//! through `tracing`.

pub mod logger;

pub use logger::{EventCapture, EventLogger, EventSink, LogEvent};
