//! Ready-made filters and defences.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::chain::FilterChain;
use crate::defence::Defence;
use crate::filter::{
    ascii_regex, FilterOptions, InvalidHeaderFilter, InvalidParameterFilter, ParameterFilterOptions,
    ParameterType, Selector,
};
use crate::handler::TerminateHandler;

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^\d*$"));
static ISO_8601_DATE: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^(\d{4}-\d{2}-\d{2}|)$"));
static MACHINE_DATE: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^[\d\-]*$"));
static REQUEST_FORMAT: Lazy<Regex> = Lazy::new(|| ascii_regex(r"^[a-zA-Z0-9\-]+$"));

/// The parameter a request format is read from unless told otherwise.
pub const DEFAULT_FORMAT_PARAMETER: &str = "_format";

/// Checks that the selected parameters hold numeric IDs. Blank values pass.
pub fn numeric_id_parameter_filter(
    selector: Selector,
    options: ParameterFilterOptions,
) -> InvalidParameterFilter {
    InvalidParameterFilter::with_compiled(selector, NUMERIC_ID.clone(), options)
}

/// Checks that the selected parameters hold `YYYY-MM-DD` dates. Blank values
/// pass.
pub fn iso8601_date_parameter_filter(
    selector: Selector,
    options: ParameterFilterOptions,
) -> InvalidParameterFilter {
    InvalidParameterFilter::with_compiled(selector, ISO_8601_DATE.clone(), options)
}

/// Checks that the selected parameters hold only digits and dashes. Blank
/// values pass.
pub fn machine_date_parameter_filter(
    selector: Selector,
    options: ParameterFilterOptions,
) -> InvalidParameterFilter {
    InvalidParameterFilter::with_compiled(selector, MACHINE_DATE.clone(), options)
}

/// Checks the request-format parameter (`_format` unless `parameter_name` is
/// given): it must be a single, non-empty, alphanumeric-and-dash value.
pub fn request_format_filter(
    parameter_name: Option<&str>,
    options: FilterOptions,
) -> InvalidParameterFilter {
    let name = parameter_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_FORMAT_PARAMETER);

    InvalidParameterFilter::with_compiled(
        Selector::Names(vec![name.to_string()]),
        REQUEST_FORMAT.clone(),
        ParameterFilterOptions::from(options).with_type(ParameterType::String),
    )
}

/// Flags requests whose user agent is absent or has no letters at all.
pub fn strict_user_agent_header_filter(options: FilterOptions) -> InvalidHeaderFilter {
    InvalidHeaderFilter::from_parts("User-Agent", has_letters, options)
}

fn has_letters(user_agent: Option<&str>) -> bool {
    user_agent.map_or(false, |user_agent| {
        user_agent.chars().any(|c| c.is_ascii_alphabetic())
    })
}

/// A defence with an empty chain that terminates suspicious requests with a
/// 403 response.
pub fn default_defence() -> Defence {
    Defence::new(FilterChain::new(), TerminateHandler::new())
}

/// [`default_defence`] with the strict user-agent filter installed.
pub fn default_defence_with_basic_filters() -> Defence {
    let chain =
        FilterChain::new().with_filter(strict_user_agent_header_filter(FilterOptions::new()));

    Defence::new(chain, TerminateHandler::new())
}
