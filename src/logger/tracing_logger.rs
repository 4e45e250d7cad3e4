use super::{LogContext, LogLevel, Logger};

/// Forwards log entries to the `tracing` ecosystem.
///
/// Levels are mapped onto the five `tracing` levels (emergency, alert, critical
/// and error all become `ERROR`); the original level is kept in the `severity`
/// field and the context is attached as JSON.
///
/// Events use the target `request_defence`, so a subscriber can route them
/// separately from the crate's own diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Creates a new tracing logger.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        let context = serde_json::to_string(context).unwrap_or_default();

        match level {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
                tracing::error!(target: "request_defence", severity = %level, context = %context, "{}", message);
            }
            LogLevel::Warning => {
                tracing::warn!(target: "request_defence", severity = %level, context = %context, "{}", message);
            }
            LogLevel::Notice | LogLevel::Info => {
                tracing::info!(target: "request_defence", severity = %level, context = %context, "{}", message);
            }
            LogLevel::Debug => {
                tracing::debug!(target: "request_defence", severity = %level, context = %context, "{}", message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_every_level_without_a_subscriber() {
        let logger = TracingLogger::new();
        let mut context = LogContext::new();
        context.insert("uri".to_string(), "http://foo.com/".into());

        for level in LogLevel::ALL {
            logger.log(level, "The request looks suspicious.", &context);
        }
    }
}
