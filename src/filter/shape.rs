use once_cell::sync::Lazy;
use regex::Regex;

use super::selector::{select_by, validate_names};
use super::{ascii_regex, log_parameter_finding, Filter, FilterOptions};
use crate::envelope::Envelope;
use crate::error::Result;

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^\d+$"));
static ISO_8601_DATE: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^\d{4}-\d{2}-\d{2}$"));
static MACHINE_DATE: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^[\d\-]+$"));

/// A fixed value shape checked by [`InvalidParameterShapeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterShape {
    /// Digits only, e.g. a database ID
    NumericId,
    /// `YYYY-MM-DD`; the shape only, not a calendar check
    Iso8601Date,
    /// Digits and dashes
    MachineDate,
}

impl ParameterShape {
    /// Returns the regex a non-blank value must match.
    pub fn regex(self) -> &'static Regex {
        match self {
            ParameterShape::NumericId => &NUMERIC_ID,
            ParameterShape::Iso8601Date => &ISO_8601_DATE,
            ParameterShape::MachineDate => &MACHINE_DATE,
        }
    }
}

/// Checks named parameters against a fixed [`ParameterShape`].
///
/// Blank values are decided by the blank policy before the regex is
/// consulted: they pass when blanks are allowed (the default) and fail when
/// they are not.
#[derive(Debug, Clone)]
pub struct InvalidParameterShapeFilter {
    shape: ParameterShape,
    names: Vec<String>,
    allow_blank: bool,
    options: FilterOptions,
}

impl InvalidParameterShapeFilter {
    /// Creates a filter checking the named parameters against `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`](crate::Error::InvalidSelector) if
    /// `names` is empty or contains a blank name.
    pub fn new<I, S>(shape: ParameterShape, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            shape,
            names: validate_names(names)?,
            allow_blank: true,
            options: FilterOptions::default(),
        })
    }

    /// Checks that the named parameters are numeric IDs.
    pub fn numeric_id<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ParameterShape::NumericId, names)
    }

    /// Checks that the named parameters are ISO 8601 dates.
    pub fn iso8601_date<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ParameterShape::Iso8601Date, names)
    }

    /// Checks that the named parameters are machine dates.
    pub fn machine_date<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ParameterShape::MachineDate, names)
    }

    /// Sets whether an empty value is acceptable.
    pub fn with_allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// Sets the filter options.
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the shape values must have.
    pub fn shape(&self) -> ParameterShape {
        self.shape
    }

    /// Returns the names of the checked parameters.
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    /// Returns `true` if empty values are acceptable.
    pub fn allow_blank(&self) -> bool {
        self.allow_blank
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn is_valid(&self, value: &str) -> bool {
        if value.is_empty() {
            return self.allow_blank;
        }
        self.shape.regex().is_match(value)
    }
}

impl Filter for InvalidParameterShapeFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let names = self.names.as_slice();
        let selected = select_by(envelope.request(), move |name| {
            names.iter().any(|checked| checked == name)
        });

        for parameter in selected {
            if parameter.value.values().any(|value| !self.is_valid(value)) {
                let message = format!(
                    "The value of `{}` does not match the regex `{}`.",
                    parameter.qualified_name(),
                    self.shape.regex().as_str()
                );
                log_parameter_finding(envelope, self.options.log_level(), &message, &parameter);
                return true;
            }
        }

        false
    }

    fn name(&self) -> &str {
        match self.shape {
            ParameterShape::NumericId => "invalid_numeric_id_parameter",
            ParameterShape::Iso8601Date => "invalid_iso8601_date_parameter",
            ParameterShape::MachineDate => "invalid_machine_date_parameter",
        }
    }
}
