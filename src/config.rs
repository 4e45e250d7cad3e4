//! Declarative filter-chain configuration.
//!
//! A [`DefenceConfig`] describes a chain as a list of `[[filters]]` tables,
//! each tagged with a `kind`. Option values are kept as strings until
//! [`DefenceConfig::build_chain`] validates them, so a typo in a log level is
//! reported with the option's name.
//!
//! # Example
//!
//! ```toml
//! [[filters]]
//! kind = "suspicious_user_agent"
//! log_level = "notice"
//!
//! [[filters]]
//! kind = "invalid_parameter"
//! names = ["q"]
//! validator = "^[a-z]*$"
//! type = "string"
//!
//! [[filters]]
//! kind = "numeric_id"
//! names = ["id", "page"]
//! allow_blank = false
//!
//! [[filters]]
//! kind = "method_override"
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::chain::FilterChain;
use crate::error::{Error, Result};
use crate::factory;
use crate::filter::{
    BannedUserAgentHeaderFilter, BlankUserAgentHeaderFilter, Filter, FilterOptions,
    InvalidMethodOverrideFilter, InvalidParameterFilter, InvalidParameterShapeFilter,
    ParameterFilterOptions, ParameterShape, ParameterType, Selector,
    SuspiciousUserAgentHeaderFilter,
};
use crate::logger::LogLevel;

/// A filter chain description, usually loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefenceConfig {
    /// Filters, in evaluation order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

/// One `[[filters]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FilterConfig {
    /// [`SuspiciousUserAgentHeaderFilter`]
    SuspiciousUserAgent {
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// [`BlankUserAgentHeaderFilter`]
    BlankUserAgent {
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// The strict user-agent filter: the user agent must contain a letter
    StrictUserAgent {
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// [`BannedUserAgentHeaderFilter`]
    BannedUserAgent {
        /// Regexes matched against the user agent
        patterns: Vec<String>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// [`InvalidParameterFilter`]
    InvalidParameter {
        /// Names of the checked parameters (exclusive with `pattern`)
        #[serde(default)]
        names: Option<Vec<String>>,
        /// Regex matched against parameter names (exclusive with `names`)
        #[serde(default)]
        pattern: Option<String>,
        /// Regex every value must match
        validator: String,
        /// `any`, `string` or `array`
        #[serde(default, rename = "type")]
        parameter_type: Option<String>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// Numeric IDs, with a blank policy
    NumericId {
        /// Names of the checked parameters
        names: Vec<String>,
        /// Whether empty values pass (default `true`)
        #[serde(default)]
        allow_blank: Option<bool>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// ISO 8601 dates, with a blank policy
    Iso8601Date {
        /// Names of the checked parameters
        names: Vec<String>,
        /// Whether empty values pass (default `true`)
        #[serde(default)]
        allow_blank: Option<bool>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// Machine dates, with a blank policy
    MachineDate {
        /// Names of the checked parameters
        names: Vec<String>,
        /// Whether empty values pass (default `true`)
        #[serde(default)]
        allow_blank: Option<bool>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// The request-format parameter check
    RequestFormat {
        /// The parameter to check (default `_format`)
        #[serde(default)]
        parameter_name: Option<String>,
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
    /// [`InvalidMethodOverrideFilter`]
    MethodOverride {
        /// Level findings are logged at
        #[serde(default)]
        log_level: Option<String>,
    },
}

impl DefenceConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if the document is malformed, has an
    /// unknown `kind`, or has unknown fields.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Ok(toml::from_str(toml)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builds the described chain.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error: an invalid option value,
    /// selector or regex.
    pub fn build_chain(&self) -> Result<FilterChain> {
        self.filters.iter().map(FilterConfig::build).collect()
    }
}

impl FromStr for DefenceConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_toml_str(s)
    }
}

impl FilterConfig {
    /// Builds the described filter.
    ///
    /// # Errors
    ///
    /// Returns the first invalid option value, selector or regex.
    pub fn build(&self) -> Result<Box<dyn Filter>> {
        let filter: Box<dyn Filter> = match self {
            FilterConfig::SuspiciousUserAgent { log_level } => Box::new(
                SuspiciousUserAgentHeaderFilter::new(filter_options(log_level)?),
            ),
            FilterConfig::BlankUserAgent { log_level } => {
                Box::new(BlankUserAgentHeaderFilter::new(filter_options(log_level)?))
            }
            FilterConfig::StrictUserAgent { log_level } => Box::new(
                factory::strict_user_agent_header_filter(filter_options(log_level)?),
            ),
            FilterConfig::BannedUserAgent {
                patterns,
                log_level,
            } => Box::new(BannedUserAgentHeaderFilter::new(
                patterns,
                filter_options(log_level)?,
            )?),
            FilterConfig::InvalidParameter {
                names,
                pattern,
                validator,
                parameter_type,
                log_level,
            } => {
                let mut options = ParameterFilterOptions::from(filter_options(log_level)?);
                if let Some(parameter_type) = parameter_type {
                    options = options.with_type(parameter_type.parse::<ParameterType>()?);
                }
                Box::new(InvalidParameterFilter::new(
                    selector(names, pattern)?,
                    validator,
                    options,
                )?)
            }
            FilterConfig::NumericId {
                names,
                allow_blank,
                log_level,
            } => shape_filter(ParameterShape::NumericId, names, *allow_blank, log_level)?,
            FilterConfig::Iso8601Date {
                names,
                allow_blank,
                log_level,
            } => shape_filter(ParameterShape::Iso8601Date, names, *allow_blank, log_level)?,
            FilterConfig::MachineDate {
                names,
                allow_blank,
                log_level,
            } => shape_filter(ParameterShape::MachineDate, names, *allow_blank, log_level)?,
            FilterConfig::RequestFormat {
                parameter_name,
                log_level,
            } => Box::new(factory::request_format_filter(
                parameter_name.as_deref(),
                filter_options(log_level)?,
            )),
            FilterConfig::MethodOverride { log_level } => {
                Box::new(InvalidMethodOverrideFilter::new(filter_options(log_level)?))
            }
        };

        Ok(filter)
    }
}

fn filter_options(log_level: &Option<String>) -> Result<FilterOptions> {
    let mut options = FilterOptions::new();
    if let Some(log_level) = log_level {
        options = options.with_log_level(log_level.parse::<LogLevel>()?);
    }
    Ok(options)
}

fn selector(names: &Option<Vec<String>>, pattern: &Option<String>) -> Result<Selector> {
    match (names, pattern) {
        (Some(names), None) => Selector::names(names.iter().cloned()),
        (None, Some(pattern)) => Selector::pattern(pattern),
        (Some(_), Some(_)) => Err(Error::InvalidSelector(
            "`names` and `pattern` are mutually exclusive".to_string(),
        )),
        (None, None) => Err(Error::InvalidSelector(
            "either `names` or `pattern` is required".to_string(),
        )),
    }
}

fn shape_filter(
    shape: ParameterShape,
    names: &[String],
    allow_blank: Option<bool>,
    log_level: &Option<String>,
) -> Result<Box<dyn Filter>> {
    let filter = InvalidParameterShapeFilter::new(shape, names.iter().cloned())?
        .with_allow_blank(allow_blank.unwrap_or(true))
        .with_options(filter_options(log_level)?);

    Ok(Box::new(filter))
}
