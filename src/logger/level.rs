use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Log severity, using the usual eight-level syslog vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    /// System is unusable
    Emergency,
    /// Action must be taken immediately
    Alert,
    /// Critical conditions
    Critical,
    /// Runtime errors that do not require immediate action
    Error,
    /// Exceptional occurrences that are not errors
    #[default]
    Warning,
    /// Normal but significant events
    Notice,
    /// Interesting events
    Info,
    /// Detailed debug information
    Debug,
}

impl LogLevel {
    /// All levels, most severe first.
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Emergency,
        LogLevel::Alert,
        LogLevel::Critical,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Notice,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    /// Returns the lowercase name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Emergency => "emergency",
            LogLevel::Alert => "alert",
            LogLevel::Critical => "critical",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Notice => "notice",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Returns the priority of the level: 8 for emergency down to 1 for debug.
    pub fn priority(self) -> u8 {
        match self {
            LogLevel::Emergency => 8,
            LogLevel::Alert => 7,
            LogLevel::Critical => 6,
            LogLevel::Error => 5,
            LogLevel::Warning => 4,
            LogLevel::Notice => 3,
            LogLevel::Info => 2,
            LogLevel::Debug => 1,
        }
    }

    /// Returns `true` if this level is at least as severe as `minimum`.
    pub fn meets(self, minimum: LogLevel) -> bool {
        self.priority() >= minimum.priority()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = LogLevel::ALL
                    .iter()
                    .map(|level| format!("`{}`", level))
                    .collect();
                Error::invalid_option("log_level", s, format!("one of {}", names.join(", ")))
            })
    }
}
