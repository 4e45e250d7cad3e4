use http::Method;

use super::{Filter, FilterOptions};
use crate::envelope::Envelope;
use crate::request::ParameterValue;

/// The header frameworks read a method override from.
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-METHOD-OVERRIDE";

const METHOD_OVERRIDE_PARAMETER: &str = "_method";

/// Methods a request may legitimately be overridden to.
pub const VALID_OVERRIDE_METHODS: [&str; 10] = [
    "HEAD", "GET", "POST", "PUT", "PATCH", "DELETE", "PURGE", "OPTIONS", "TRACE", "CONNECT",
];

/// Flags abuse of HTTP method overriding.
///
/// Overrides are collected from the `X-HTTP-METHOD-OVERRIDE` header, the body
/// parameter `_method` and the query parameter `_method`, and compared in
/// upper case. The request is suspicious if:
/// - any override is a list rather than a single value;
/// - any override is not a known method;
/// - an override is present but the request was not made with `POST`.
///
/// A request with no override is never suspicious.
#[derive(Debug, Clone, Default)]
pub struct InvalidMethodOverrideFilter {
    options: FilterOptions,
}

impl InvalidMethodOverrideFilter {
    /// Creates the filter.
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl Filter for InvalidMethodOverrideFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let request = envelope.request();
        let level = self.options.log_level();

        let mut overrides = Vec::new();
        if let Some(header) = request.header(METHOD_OVERRIDE_HEADER) {
            overrides.push(header.to_ascii_uppercase());
        }
        for bag in [request.body(), request.query()] {
            match bag.get(METHOD_OVERRIDE_PARAMETER) {
                None => {}
                Some(ParameterValue::Scalar(method)) => overrides.push(method.to_ascii_uppercase()),
                Some(ParameterValue::List(_)) => {
                    envelope.add_log_entry(level, "The type of the request-method override is invalid");
                    return true;
                }
            }
        }

        if overrides.is_empty() {
            return false;
        }

        let invalid: Vec<String> = overrides
            .iter()
            .filter(|method| !VALID_OVERRIDE_METHODS.contains(&method.as_str()))
            .map(|method| format!("`{}`", method))
            .collect();
        if !invalid.is_empty() {
            let message = format!(
                "The request contains invalid request-method overrides: {}",
                invalid.join(", ")
            );
            envelope.add_log_entry(level, &message);
            return true;
        }

        let method = request.method();
        if *method != Method::POST {
            let message = format!(
                "The request-method override accompanies a `{}` request",
                method
            );
            envelope.add_log_entry(level, &message);
            return true;
        }

        false
    }

    fn name(&self) -> &str {
        "invalid_method_override"
    }
}
