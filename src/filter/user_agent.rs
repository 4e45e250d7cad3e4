//! User-agent header filters.

use regex::Regex;

use super::{Filter, FilterOptions};
use crate::envelope::Envelope;
use crate::error::{Error, Result};

const USER_AGENT: &str = "user-agent";

/// Flags requests with a missing or meaningless user agent.
///
/// Suspicious when the header is absent, blank, or `-` once surrounding
/// whitespace is trimmed. Genuine browsers and well-behaved bots always send
/// something more.
#[derive(Debug, Clone, Default)]
pub struct SuspiciousUserAgentHeaderFilter {
    options: FilterOptions,
}

impl SuspiciousUserAgentHeaderFilter {
    /// Creates the filter.
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl Filter for SuspiciousUserAgentHeaderFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let level = self.options.log_level();

        let Some(user_agent) = envelope.request().header(USER_AGENT) else {
            envelope.add_log_entry(level, "The request has no UA string.");
            return true;
        };

        let trimmed = user_agent.trim();
        if trimmed.is_empty() || trimmed == "-" {
            envelope.add_log_entry(level, "The request has a suspicious UA string.");
            return true;
        }

        false
    }

    fn name(&self) -> &str {
        "suspicious_user_agent"
    }
}

/// Flags requests whose user agent is absent or blank.
///
/// A narrower check than [`SuspiciousUserAgentHeaderFilter`]: a `-` user agent
/// passes.
#[derive(Debug, Clone, Default)]
pub struct BlankUserAgentHeaderFilter {
    options: FilterOptions,
}

impl BlankUserAgentHeaderFilter {
    /// Creates the filter.
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl Filter for BlankUserAgentHeaderFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let blank = envelope
            .request()
            .header(USER_AGENT)
            .map_or(true, |user_agent| user_agent.trim().is_empty());

        if blank {
            envelope.add_log_entry(self.options.log_level(), "The request has no UA string.");
        }
        blank
    }

    fn name(&self) -> &str {
        "blank_user_agent"
    }
}

/// Flags requests made by banned user agents.
///
/// Suspicious when the user agent matches any of the configured patterns. A
/// request without a user agent is not suspicious here: there is nothing to
/// compare, and absence is [`SuspiciousUserAgentHeaderFilter`]'s concern.
///
/// # Example
///
/// ```
/// use request_defence::{BannedUserAgentHeaderFilter, FilterOptions};
///
/// let filter = BannedUserAgentHeaderFilter::new(["(?i)semrush", "^curl/"], FilterOptions::new())
///     .unwrap();
/// assert_eq!(filter.patterns().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BannedUserAgentHeaderFilter {
    patterns: Vec<Regex>,
    options: FilterOptions,
}

impl BannedUserAgentHeaderFilter {
    /// Creates a filter banning user agents that match any of `patterns`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if no pattern (or an empty pattern)
    /// is given and [`Error::InvalidPattern`] if one does not compile.
    pub fn new<I, S>(patterns: I, options: FilterOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                if pattern.is_empty() {
                    return Err(Error::InvalidSelector(
                        "user-agent patterns cannot be empty".to_string(),
                    ));
                }
                Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            return Err(Error::InvalidSelector(
                "at least one user-agent pattern is required".to_string(),
            ));
        }

        Ok(Self { patterns, options })
    }

    /// Returns the banned patterns, as written.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl Filter for BannedUserAgentHeaderFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let Some(user_agent) = envelope.request().header(USER_AGENT) else {
            return false;
        };

        let banned = self
            .patterns
            .iter()
            .any(|pattern| pattern.is_match(&user_agent));

        if banned {
            envelope.add_log_entry(
                self.options.log_level(),
                "The request was made via a banned user agent.",
            );
        }
        banned
    }

    fn name(&self) -> &str {
        "banned_user_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::{LogLevel, MemoryLogger};
    use crate::request::Request;
    use std::sync::Arc;

    fn evaluate(filter: &dyn Filter, user_agent: Option<&str>) -> (bool, Vec<String>) {
        let mut builder = Request::get("http://foo.com/");
        if let Some(user_agent) = user_agent {
            builder = builder.header("User-Agent", user_agent);
        }
        let logger = Arc::new(MemoryLogger::new());
        let envelope = Envelope::new(builder.build().unwrap(), logger.clone());

        (filter.evaluate(&envelope), logger.messages())
    }

    #[test]
    fn suspicious_user_agent_scenarios() {
        let filter = SuspiciousUserAgentHeaderFilter::default();

        assert_eq!(
            evaluate(&filter, None),
            (true, vec!["The request has no UA string.".to_string()])
        );
        for blank in ["", " ", "-", " - "] {
            assert_eq!(
                evaluate(&filter, Some(blank)),
                (true, vec!["The request has a suspicious UA string.".to_string()]),
                "user agent: {:?}",
                blank
            );
        }
        assert_eq!(evaluate(&filter, Some("Mozilla/5.0")), (false, vec![]));
        assert_eq!(evaluate(&filter, Some("123")), (false, vec![]));
    }

    #[test]
    fn suspicious_user_agent_logs_at_the_configured_level() {
        let filter =
            SuspiciousUserAgentHeaderFilter::new(FilterOptions::new().with_log_level(LogLevel::Info));
        let logger = Arc::new(MemoryLogger::new());
        let envelope = Envelope::new(Request::get("/").build().unwrap(), logger.clone());

        assert!(filter.evaluate(&envelope));
        assert_eq!(logger.records_at(LogLevel::Info).len(), 1);
        assert_eq!(filter.options().log_level(), LogLevel::Info);
    }

    #[test]
    fn blank_user_agent_scenarios() {
        let filter = BlankUserAgentHeaderFilter::default();

        assert!(evaluate(&filter, None).0);
        assert!(evaluate(&filter, Some("")).0);
        assert!(evaluate(&filter, Some("  ")).0);
        assert!(!evaluate(&filter, Some("-")).0);
        assert!(!evaluate(&filter, Some("Mozilla/5.0")).0);
    }

    #[test]
    fn banned_user_agents_are_suspicious() {
        let filter =
            BannedUserAgentHeaderFilter::new(["(?i)semrushbot", "^curl/"], FilterOptions::new())
                .unwrap();

        let (suspicious, messages) = evaluate(
            &filter,
            Some("Mozilla/5.0 (compatible; SemrushBot/7~bl; +http://www.semrush.com/bot.html)"),
        );
        assert!(suspicious);
        assert_eq!(messages, vec!["The request was made via a banned user agent."]);

        assert!(evaluate(&filter, Some("curl/8.4.0")).0);
        assert!(!evaluate(&filter, Some("Mozilla/5.0 (X11; Linux x86_64)")).0);
    }

    #[test]
    fn banned_user_agent_ignores_an_absent_header() {
        let filter = BannedUserAgentHeaderFilter::new([".*"], FilterOptions::new()).unwrap();

        assert_eq!(evaluate(&filter, None), (false, vec![]));
    }

    #[test]
    fn banned_user_agent_requires_valid_patterns() {
        let none: [&str; 0] = [];
        assert!(matches!(
            BannedUserAgentHeaderFilter::new(none, FilterOptions::new()),
            Err(Error::InvalidSelector(_))
        ));
        assert!(matches!(
            BannedUserAgentHeaderFilter::new([""], FilterOptions::new()),
            Err(Error::InvalidSelector(_))
        ));
        assert!(matches!(
            BannedUserAgentHeaderFilter::new(["(bot"], FilterOptions::new()),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn filters_have_names() {
        assert_eq!(SuspiciousUserAgentHeaderFilter::default().name(), "suspicious_user_agent");
        assert_eq!(BlankUserAgentHeaderFilter::default().name(), "blank_user_agent");
    }
}
