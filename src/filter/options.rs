use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::logger::LogLevel;
use crate::request::ParameterValue;

/// Options shared by every built-in filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterOptions {
    log_level: LogLevel,
}

impl FilterOptions {
    /// Default options: findings are logged at `warning`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level findings are logged at.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Returns the level findings are logged at.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }
}

/// The shape a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterType {
    /// No constraint
    #[default]
    Any,
    /// A single value; lists are rejected
    String,
    /// A list of values; single values are rejected
    Array,
}

impl ParameterType {
    /// Returns the lowercase name of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterType::Any => "any",
            ParameterType::String => "string",
            ParameterType::Array => "array",
        }
    }

    /// Returns `true` if `value` has this type.
    pub fn accepts(self, value: &ParameterValue) -> bool {
        match self {
            ParameterType::Any => true,
            ParameterType::String => !value.is_list(),
            ParameterType::Array => value.is_list(),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(ParameterType::Any),
            "string" => Ok(ParameterType::String),
            "array" => Ok(ParameterType::Array),
            other => Err(Error::invalid_option(
                "type",
                other,
                "one of `any`, `string`, `array`",
            )),
        }
    }
}

/// Options for [`InvalidParameterFilter`](super::InvalidParameterFilter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterFilterOptions {
    log_level: LogLevel,
    parameter_type: ParameterType,
}

impl ParameterFilterOptions {
    /// Default options: log at `warning`, accept any type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the level findings are logged at.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Sets the type every selected parameter must have.
    pub fn with_type(mut self, parameter_type: ParameterType) -> Self {
        self.parameter_type = parameter_type;
        self
    }

    /// Returns the level findings are logged at.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Returns the required parameter type.
    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }
}

impl From<FilterOptions> for ParameterFilterOptions {
    fn from(options: FilterOptions) -> Self {
        Self::new().with_log_level(options.log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(FilterOptions::new().log_level(), LogLevel::Warning);

        let options = ParameterFilterOptions::new();
        assert_eq!(options.log_level(), LogLevel::Warning);
        assert_eq!(options.parameter_type(), ParameterType::Any);
    }

    #[test]
    fn builders_override_defaults() {
        let options = ParameterFilterOptions::new()
            .with_log_level(LogLevel::Emergency)
            .with_type(ParameterType::Array);

        assert_eq!(options.log_level(), LogLevel::Emergency);
        assert_eq!(options.parameter_type(), ParameterType::Array);
    }

    #[test]
    fn filter_options_convert_keeping_the_level() {
        let options: ParameterFilterOptions =
            FilterOptions::new().with_log_level(LogLevel::Debug).into();

        assert_eq!(options.log_level(), LogLevel::Debug);
        assert_eq!(options.parameter_type(), ParameterType::Any);
    }

    #[test]
    fn parses_type_names() {
        assert_eq!("any".parse::<ParameterType>().unwrap(), ParameterType::Any);
        assert_eq!("string".parse::<ParameterType>().unwrap(), ParameterType::String);
        assert_eq!("array".parse::<ParameterType>().unwrap(), ParameterType::Array);
    }

    #[test]
    fn rejects_unknown_type_names() {
        for name in ["integer", "String", ""] {
            let err = name.parse::<ParameterType>().unwrap_err();
            assert_eq!(err.option(), Some("type"));
        }
    }

    #[test]
    fn types_check_the_value_shape() {
        let scalar = ParameterValue::from("1");
        let list = ParameterValue::from(vec!["1", "2"]);

        assert!(ParameterType::Any.accepts(&scalar));
        assert!(ParameterType::Any.accepts(&list));
        assert!(ParameterType::String.accepts(&scalar));
        assert!(!ParameterType::String.accepts(&list));
        assert!(!ParameterType::Array.accepts(&scalar));
        assert!(ParameterType::Array.accepts(&list));
    }
}
