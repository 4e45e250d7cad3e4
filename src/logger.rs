//! Logging sinks for suspicious-request reports.
//!
//! Filters report what they found through the [`Logger`] carried by the
//! [`Envelope`](crate::Envelope). This module defines that interface and ships
//! a few sinks:
//! - [`NullLogger`]: discards everything (prevention-only deployments)
//! - [`MemoryLogger`]: keeps records in memory, in order
//! - [`TracingLogger`]: forwards records to `tracing`
//! - [`SlackLogger`]: posts records to a Slack incoming webhook
//!
//! Every sink must be `Send + Sync`: one logger is usually shared by all
//! in-flight requests.

mod level;
mod memory;
mod slack;
mod tracing_logger;

use std::sync::Arc;

pub use level::LogLevel;
pub use memory::{LogRecord, MemoryLogger};
pub use slack::{SlackLogger, UreqTransport, WebhookTransport};
pub use tracing_logger::TracingLogger;

/// Structured context attached to a log entry.
pub type LogContext = serde_json::Map<String, serde_json::Value>;

/// A structured log sink.
pub trait Logger: Send + Sync {
    /// Records one entry.
    ///
    /// Sinks that can fail (e.g. network sinks) deal with the failure
    /// themselves; filter evaluation never observes it.
    fn log(&self, level: LogLevel, message: &str, context: &LogContext);
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        (**self).log(level, message, context);
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        (**self).log(level, message, context);
    }
}

/// A logger that does nothing.
///
/// Use it when the defence only needs to reject suspicious requests and nobody
/// is interested in why.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: LogLevel, _message: &str, _context: &LogContext) {}
}
