//! Filters: the individual checks a request is run through.
//!
//! A filter looks at the [`Envelope`] and answers one question: is this
//! request suspicious? When the answer is yes it usually also records why,
//! through the envelope's logger, at the level configured in its options.
//!
//! Filters are built once, validated eagerly, and then shared read-only by
//! every request; evaluation never fails.
//!
//! # Built-in filters
//!
//! | Filter | Looks at |
//! |---|---|
//! | [`InvalidParameterFilter`] | selected parameters, against a type and a regex |
//! | [`InvalidParameterShapeFilter`] | named parameters, against a fixed shape with a blank policy |
//! | [`SuspiciousUserAgentHeaderFilter`] | absent, blank or `-` user agent |
//! | [`BlankUserAgentHeaderFilter`] | absent or blank user agent |
//! | [`BannedUserAgentHeaderFilter`] | user agents matching banned patterns |
//! | [`InvalidHeaderFilter`] | any header, against a predicate |
//! | [`InvalidMethodOverrideFilter`] | HTTP method overrides |
//!
//! Any `Fn(&Envelope) -> bool + Send + Sync` closure is a filter too.

mod header;
mod method_override;
mod options;
mod parameter;
mod selector;
mod shape;
mod user_agent;

pub use header::InvalidHeaderFilter;
pub use method_override::{InvalidMethodOverrideFilter, METHOD_OVERRIDE_HEADER, VALID_OVERRIDE_METHODS};
pub use options::{FilterOptions, ParameterFilterOptions, ParameterType};
pub use parameter::InvalidParameterFilter;
pub use selector::{SelectedParameter, Selector};
pub use shape::{InvalidParameterShapeFilter, ParameterShape};
pub use user_agent::{
    BannedUserAgentHeaderFilter, BlankUserAgentHeaderFilter, SuspiciousUserAgentHeaderFilter,
};

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::envelope::Envelope;
use crate::logger::{LogContext, LogLevel};

/// Compiles a built-in pattern with ASCII-only classes, so `\d` is `[0-9]`.
pub(crate) fn ascii_regex(pattern: &'static str) -> Regex {
    RegexBuilder::new(pattern)
        .unicode(false)
        .build()
        .expect("built-in pattern compiles")
}

/// A single check applied to a request.
pub trait Filter: Send + Sync {
    /// Returns `true` if the request is suspicious.
    ///
    /// May log a diagnostic entry through the envelope as a side effect.
    fn evaluate(&self, envelope: &Envelope) -> bool;

    /// A short name for diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Filter for F
where
    F: Fn(&Envelope) -> bool + Send + Sync,
{
    fn evaluate(&self, envelope: &Envelope) -> bool {
        self(envelope)
    }
}

/// Logs a finding about one selected parameter, naming it in the context.
pub(crate) fn log_parameter_finding(
    envelope: &Envelope,
    level: LogLevel,
    message: &str,
    parameter: &SelectedParameter<'_>,
) {
    let mut extra = LogContext::new();
    extra.insert(
        "parameter".to_string(),
        Value::from(parameter.qualified_name()),
    );
    envelope.add_log_entry_with(level, message, extra);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullLogger;
    use crate::request::Request;
    use std::sync::Arc;

    #[test]
    fn closures_are_filters() {
        let envelope = Envelope::new(
            Request::get("/?id=1").build().unwrap(),
            Arc::new(NullLogger),
        );

        let has_id = |envelope: &Envelope| envelope.request().query().contains("id");
        let has_page = |envelope: &Envelope| envelope.request().query().contains("page");

        assert!(has_id.evaluate(&envelope));
        assert!(!has_page.evaluate(&envelope));
    }

    #[test]
    fn built_in_patterns_only_accept_ascii_digits() {
        let digits = ascii_regex(r"^\d+$");

        assert_eq!(digits.as_str(), r"^\d+$");
        assert!(digits.is_match("0123456789"));
        assert!(!digits.is_match("١٢٣"));
    }

    #[test]
    fn boxed_filters_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Filter>();
    }
}
