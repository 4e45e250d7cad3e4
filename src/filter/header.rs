use std::fmt;

use http::HeaderName;

use super::{Filter, FilterOptions};
use crate::envelope::Envelope;
use crate::error::{Error, Result};

type HeaderValidator = Box<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// Validates one header with an arbitrary predicate.
///
/// The predicate receives the header value, or `None` when the header is
/// absent, and returns `true` if it is acceptable.
///
/// # Example
///
/// ```
/// use request_defence::{FilterOptions, InvalidHeaderFilter};
///
/// let filter = InvalidHeaderFilter::new(
///     "Accept-Language",
///     |value| value.map_or(true, |value| value.len() < 64),
///     FilterOptions::new(),
/// )
/// .unwrap();
///
/// assert_eq!(filter.header(), "Accept-Language");
/// ```
pub struct InvalidHeaderFilter {
    header: String,
    validator: HeaderValidator,
    options: FilterOptions,
}

impl InvalidHeaderFilter {
    /// Creates a filter validating `header` with `validator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if `header` is not a valid header
    /// name.
    pub fn new<F>(header: &str, validator: F, options: FilterOptions) -> Result<Self>
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            return Err(Error::invalid_option(
                "header",
                header,
                "a valid header name",
            ));
        }

        Ok(Self::from_parts(header, validator, options))
    }

    pub(crate) fn from_parts<F>(header: &str, validator: F, options: FilterOptions) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        Self {
            header: header.to_string(),
            validator: Box::new(validator),
            options,
        }
    }

    /// Returns the name of the validated header, as given.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns the options.
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}

impl fmt::Debug for InvalidHeaderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvalidHeaderFilter")
            .field("header", &self.header)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Filter for InvalidHeaderFilter {
    fn evaluate(&self, envelope: &Envelope) -> bool {
        let value = envelope.request().header(&self.header);

        if (self.validator)(value.as_deref()) {
            return false;
        }

        let message = format!(
            "The value of header `{}`, `{}`, is invalid",
            self.header,
            value.as_deref().unwrap_or_default()
        );
        envelope.add_log_entry(self.options.log_level(), &message);
        true
    }

    fn name(&self) -> &str {
        "invalid_header"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::request::Request;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn evaluate(filter: &InvalidHeaderFilter, request: Request) -> (bool, Vec<String>) {
        let logger = Arc::new(MemoryLogger::new());
        let envelope = Envelope::new(request, logger.clone());
        (filter.evaluate(&envelope), logger.messages())
    }

    fn has_letter(value: Option<&str>) -> bool {
        value.map_or(false, |value| value.chars().any(|c| c.is_ascii_alphabetic()))
    }

    #[test]
    fn valid_header_is_clean() {
        let filter = InvalidHeaderFilter::new("User-Agent", has_letter, FilterOptions::new()).unwrap();
        let request = Request::get("/").header("User-Agent", "Mozilla/5.0").build().unwrap();

        assert_eq!(evaluate(&filter, request), (false, vec![]));
    }

    #[test]
    fn invalid_header_is_reported_with_its_value() {
        let filter = InvalidHeaderFilter::new("User-Agent", has_letter, FilterOptions::new()).unwrap();
        let request = Request::get("/").header("user-agent", "123").build().unwrap();

        assert_eq!(
            evaluate(&filter, request),
            (
                true,
                vec!["The value of header `User-Agent`, `123`, is invalid".to_string()]
            )
        );
    }

    #[test]
    fn absent_header_reaches_the_predicate_as_none() {
        let seen_none = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen_none);
        let filter = InvalidHeaderFilter::new(
            "X-Api-Key",
            move |value| {
                if value.is_none() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                value.is_some()
            },
            FilterOptions::new(),
        )
        .unwrap();

        let (suspicious, messages) = evaluate(&filter, Request::get("/").build().unwrap());

        assert!(suspicious);
        assert_eq!(messages, vec!["The value of header `X-Api-Key`, ``, is invalid"]);
        assert_eq!(seen_none.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejects_invalid_header_names() {
        let err = InvalidHeaderFilter::new("Bad Header", |_| true, FilterOptions::new()).unwrap_err();
        assert_eq!(err.option(), Some("header"));
    }
}
