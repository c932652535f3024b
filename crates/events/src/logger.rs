//! Single-consumer event logger backed by a `tokio::sync::mpsc` channel.
//!
//! Any number of producers publish [`LogEvent`]s through cloned
//! [`EventSink`]s. One task spawned by [`EventLogger::spawn`] renders them.
//! Shutdown is a flush-then-stop handshake: [`EventLogger::shutdown`] queues a
//! stop signal behind everything already sent and waits for the task to reach
//! it, so no event enqueued before the call is lost.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// LogEvent
// ---------------------------------------------------------------------------

/// A single operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    /// Who produced the message, e.g. `"HccConfig"` or `"PRD:CleanTrace"`.
    pub source: String,

    /// Free-form message text.
    pub message: String,

    /// Only rendered when the logger runs in verbose mode.
    pub verbose: bool,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(source: impl Into<String>, message: impl Into<String>, verbose: bool) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            verbose,
            timestamp: Utc::now(),
        }
    }
}

/// Messages travelling over the channel.
#[derive(Debug)]
enum Signal {
    Event(LogEvent),
    Shutdown,
}

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Producer handle for the event stream.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<Signal>,
}

impl EventSink {
    /// Publish an event.
    ///
    /// If the consumer has already stopped the event is silently dropped.
    pub fn emit(&self, event: LogEvent) {
        // A SendError only means the receiving task is gone.
        let _ = self.sender.send(Signal::Event(event));
    }

    /// Publish an event that is always rendered.
    pub fn info(&self, source: impl Into<String>, message: impl Into<String>) {
        self.emit(LogEvent::new(source, message, false));
    }

    /// Publish an event that is only rendered in verbose mode.
    pub fn verbose(&self, source: impl Into<String>, message: impl Into<String>) {
        self.emit(LogEvent::new(source, message, true));
    }

    /// Create a sink whose events are collected in memory instead of rendered.
    ///
    /// Used by tests that assert on the diagnostic trail of an operation.
    pub fn capture() -> (Self, EventCapture) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, EventCapture { receiver })
    }
}

/// In-memory receiving end created by [`EventSink::capture`].
#[derive(Debug)]
pub struct EventCapture {
    receiver: mpsc::UnboundedReceiver<Signal>,
}

impl EventCapture {
    /// Take every event published so far, in publication order.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        let mut events = Vec::new();
        while let Ok(signal) = self.receiver.try_recv() {
            if let Signal::Event(event) = signal {
                events.push(event);
            }
        }
        events
    }
}

// ---------------------------------------------------------------------------
// EventLogger
// ---------------------------------------------------------------------------

/// Owner of the background rendering task.
pub struct EventLogger {
    sender: mpsc::UnboundedSender<Signal>,
    handle: JoinHandle<usize>,
}

impl EventLogger {
    /// Spawn the consumer task on the current tokio runtime.
    ///
    /// Verbose-only events are rendered only when `verbose` is true.
    pub fn spawn(verbose: bool) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(consume(receiver, verbose));
        Self { sender, handle }
    }

    /// A new producer handle for this logger.
    pub fn sink(&self) -> EventSink {
        EventSink {
            sender: self.sender.clone(),
        }
    }

    /// Flush every pending event, then stop the consumer.
    ///
    /// Returns the number of events that were rendered.
    pub async fn shutdown(self) -> usize {
        let _ = self.sender.send(Signal::Shutdown);
        match self.handle.await {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(error = %e, "Event logger task failed");
                0
            }
        }
    }
}

/// Consumer loop: render events until the stop signal or channel close.
async fn consume(mut receiver: mpsc::UnboundedReceiver<Signal>, verbose: bool) -> usize {
    let mut rendered = 0;
    while let Some(signal) = receiver.recv().await {
        match signal {
            Signal::Event(event) => {
                if should_render(&event, verbose) {
                    render(&event);
                    rendered += 1;
                }
            }
            Signal::Shutdown => break,
        }
    }
    rendered
}

fn should_render(event: &LogEvent, verbose: bool) -> bool {
    !event.verbose || verbose
}

fn render(event: &LogEvent) {
    tracing::info!(source = %event.source, "{}:{}", event.source, event.message.trim_end());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
