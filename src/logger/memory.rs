//! In-memory log recorder.

use parking_lot::Mutex;

use super::{LogContext, LogLevel, Logger};

/// A single recorded log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity of the entry
    pub level: LogLevel,
    /// The message
    pub message: String,
    /// Structured context
    pub context: LogContext,
}

/// Keeps log entries in memory, in the order they were written.
///
/// Useful in tests and for passing findings from filters to a handler within
/// one request.
///
/// # Example
///
/// ```
/// use request_defence::{LogContext, LogLevel, Logger, MemoryLogger};
///
/// let logger = MemoryLogger::new();
/// logger.log(LogLevel::Warning, "The request has no UA string.", &LogContext::new());
///
/// assert_eq!(logger.len(), 1);
/// assert_eq!(logger.records_at(LogLevel::Warning).len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns a snapshot of the records at one level.
    pub fn records_at(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Returns the messages of all records, in order.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Discards all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let logger = MemoryLogger::new();
        assert!(logger.is_empty());
        assert_eq!(logger.len(), 0);
    }

    #[test]
    fn records_entries_in_order_with_context() {
        let logger = MemoryLogger::new();
        let mut context = LogContext::new();
        context.insert("uri".to_string(), "http://foo.com/".into());

        logger.log(LogLevel::Emergency, "first", &context);
        logger.log(LogLevel::Debug, "second", &LogContext::new());

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, LogLevel::Emergency);
        assert_eq!(records[0].context["uri"], "http://foo.com/");
        assert_eq!(logger.messages(), vec!["first", "second"]);
    }

    #[test]
    fn groups_by_level() {
        let logger = MemoryLogger::new();
        logger.log(LogLevel::Warning, "a", &LogContext::new());
        logger.log(LogLevel::Notice, "b", &LogContext::new());
        logger.log(LogLevel::Warning, "c", &LogContext::new());

        let warnings = logger.records_at(LogLevel::Warning);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[1].message, "c");
        assert!(logger.records_at(LogLevel::Alert).is_empty());
    }

    #[test]
    fn clear_discards_records() {
        let logger = MemoryLogger::new();
        logger.log(LogLevel::Info, "a", &LogContext::new());
        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn concurrent_writers_are_all_recorded() {
        let logger = MemoryLogger::new();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        logger.log(LogLevel::Info, "entry", &LogContext::new());
                    }
                });
            }
        });

        assert_eq!(logger.len(), 100);
    }
}
