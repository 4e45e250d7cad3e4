use regex::Regex;

use super::{log_parameter_finding, Filter, ParameterFilterOptions, Selector};
use crate::envelope::Envelope;
use crate::error::{Error, Result};

/// Validates selected parameters against a type and a regex.
///
/// For each selected parameter, in selection order:
/// 1. if the value does not have the configured [`ParameterType`], the
///    request is suspicious and the regex is not applied;
/// 2. otherwise every value (each element of a list) must match the
///    validator; the first one that doesn't makes the request suspicious.
///
/// Evaluation stops at the first failure, which is the only one logged.
///
/// [`ParameterType`]: super::ParameterType
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use request_defence::{
///     Envelope, Filter, InvalidParameterFilter, MemoryLogger, ParameterFilterOptions, Request,
///     Selector,
/// };
///
/// let filter = InvalidParameterFilter::new(
///     Selector::names(["starts_on"]).unwrap(),
///     r"^\d{4}-\d{2}-\d{2}$",
///     ParameterFilterOptions::new(),
/// )
/// .unwrap();
///
/// let logger = Arc::new(MemoryLogger::new());
/// let clean = Envelope::new(Request::get("/?starts_on=2020-03-12").build().unwrap(), logger.clone());
/// let padded = Envelope::new(Request::get("/?starts_on=+2020-03-12+").build().unwrap(), logger.clone());
///
/// assert!(!filter.evaluate(&clean));
/// assert!(filter.evaluate(&padded));
/// assert_eq!(logger.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct InvalidParameterFilter {
    selector: Selector,
    validator: Regex,
    options: ParameterFilterOptions,
}

impl InvalidParameterFilter {
    /// Creates a filter applying `validator` to the parameters picked by
    /// `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for an empty validator and
    /// [`Error::InvalidPattern`] if it does not compile.
    pub fn new(
        selector: Selector,
        validator: &str,
        options: ParameterFilterOptions,
    ) -> Result<Self> {
        if validator.is_empty() {
            return Err(Error::invalid_option(
                "validator",
                validator,
                "a non-empty regex",
            ));
        }

        let validator = Regex::new(validator).map_err(|source| Error::InvalidPattern {
            pattern: validator.to_string(),
            source,
        })?;

        Ok(Self::with_compiled(selector, validator, options))
    }

    pub(crate) fn with_compiled(
        selector: Selector,
        validator: Regex,
        options: ParameterFilterOptions,
    ) -> Self {
        Self {
            selector,
            validator,
            options,
        }
    }

    /// Returns the selector.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Returns the validator regex, as written.
    pub fn validator(&self) -> &str {
        self.validator.as_str()
    }

    /// Returns the options.
    pub fn options(&self) -> &ParameterFilterOptions {
        &self.options
    }
}

impl Filter for InvalidParameterFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let level = self.options.log_level();
        let required_type = self.options.parameter_type();

        for parameter in self.selector.select(envelope.request()) {
            if !required_type.accepts(parameter.value) {
                let message = format!(
                    "The value of `{}` is not of type `{}`",
                    parameter.qualified_name(),
                    required_type
                );
                log_parameter_finding(envelope, level, &message, &parameter);
                return true;
            }

            if parameter
                .value
                .values()
                .any(|value| !self.validator.is_match(value))
            {
                let message = format!(
                    "The value of `{}` failed validation using the regex `{}`.",
                    parameter.qualified_name(),
                    self.validator.as_str()
                );
                log_parameter_finding(envelope, level, &message, &parameter);
                return true;
            }
        }

        false
    }

    fn name(&self) -> &str {
        "invalid_parameter"
    }
}
