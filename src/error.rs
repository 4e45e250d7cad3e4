use thiserror::Error;

/// Errors that can occur while configuring or wiring up a defence.
///
/// Evaluating a request never produces an error: a missing header or parameter
/// is simply "not present". Every variant here is raised while a filter, logger,
/// request or configuration is being constructed, so a half-valid filter can
/// never reach a chain.
#[derive(Debug, Error)]
pub enum Error {
    /// The selector was empty or otherwise unusable.
    #[error("The selector is invalid: {0}")]
    InvalidSelector(String),

    /// A regular expression failed to compile.
    #[error("The regex `{pattern}` is invalid: {source}")]
    InvalidPattern {
        /// The offending pattern, as supplied
        pattern: String,
        /// The underlying compilation error
        #[source]
        source: regex::Error,
    },

    /// An option was given a value outside its accepted set.
    #[error("Option `{option}` has the invalid value `{value}`; expected {expected}")]
    InvalidOption {
        /// Name of the option (e.g. `type`, `log_level`, `webhook_url`)
        option: &'static str,
        /// The rejected value
        value: String,
        /// Human-readable description of what is accepted
        expected: String,
    },

    /// A request could not be assembled from its parts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A TOML configuration document failed to parse.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A remote logging sink failed to deliver a message.
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl Error {
    /// Creates an `InvalidOption` error.
    pub(crate) fn invalid_option(
        option: &'static str,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Error::InvalidOption {
            option,
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Returns the name of the offending option, if this is an option error.
    pub fn option(&self) -> Option<&'static str> {
        match self {
            Error::InvalidOption { option, .. } => Some(*option),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_option_names_the_option() {
        let err = Error::invalid_option("type", "integer", "one of `any`, `string`, `array`");

        assert_eq!(err.option(), Some("type"));
        assert_eq!(
            err.to_string(),
            "Option `type` has the invalid value `integer`; expected one of `any`, `string`, `array`"
        );
    }

    #[test]
    fn invalid_pattern_keeps_source() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = Error::InvalidPattern {
            pattern: "(".to_string(),
            source,
        };

        assert!(err.to_string().starts_with("The regex `(` is invalid"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.option(), None);
    }

    #[test]
    fn config_parse_error_converts() {
        let toml_err = toml::from_str::<toml::Value>("[invalid").unwrap_err();
        let err: Error = toml_err.into();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
