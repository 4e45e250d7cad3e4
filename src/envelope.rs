//! Per-request context passed down the filter chain and into the handler.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::logger::{LogContext, LogLevel, Logger};
use crate::request::Request;

static HOST_NAME: Lazy<Option<String>> = Lazy::new(sysinfo::System::host_name);

/// Bundles an inbound request with the logger that findings are reported to.
///
/// An envelope is created once per request and borrowed by every filter and
/// by the handler. The request and logger cannot be swapped after
/// construction.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use request_defence::{Envelope, LogLevel, MemoryLogger, Request};
///
/// let logger = Arc::new(MemoryLogger::new());
/// let request = Request::get("http://foo.com/?bar=baz").build().unwrap();
/// let envelope = Envelope::new(request, logger.clone());
///
/// envelope.add_log_entry(LogLevel::Warning, "The request looks suspicious.");
///
/// let record = &logger.records()[0];
/// assert_eq!(record.context["uri"], "http://foo.com/?bar=baz");
/// assert_eq!(record.context["request_method"], "GET");
/// ```
pub struct Envelope {
    request: Request,
    logger: Arc<dyn Logger>,
}

impl Envelope {
    /// Creates an envelope for one request.
    pub fn new(request: Request, logger: Arc<dyn Logger>) -> Self {
        Self { request, logger }
    }

    /// Returns the request under inspection.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the logger findings are reported to.
    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Builds the context attached to every log entry for this request.
    ///
    /// Always contains `request_method` and `uri`, plus `host_name` when the
    /// host name can be determined. `user_agent` and `referer` are added when
    /// those headers are present, and `parameters` when the body scope is not
    /// empty.
    pub fn log_context(&self) -> LogContext {
        let request = &self.request;
        let mut context = LogContext::new();

        if let Some(host_name) = HOST_NAME.as_deref() {
            context.insert("host_name".to_string(), Value::from(host_name));
        }
        context.insert(
            "request_method".to_string(),
            Value::from(request.method().as_str()),
        );
        context.insert("uri".to_string(), Value::from(request.uri()));

        if let Some(user_agent) = request.header("user-agent") {
            context.insert("user_agent".to_string(), Value::from(user_agent.into_owned()));
        }
        if let Some(referer) = request.header("referer") {
            context.insert("referer".to_string(), Value::from(referer.into_owned()));
        }
        if !request.body().is_empty() {
            context.insert(
                "parameters".to_string(),
                Value::Object(request.body().clone().into()),
            );
        }

        context
    }

    /// Logs a message, with the request's context, at the given level.
    pub fn add_log_entry(&self, level: LogLevel, message: &str) {
        self.logger.log(level, message, &self.log_context());
    }

    /// Logs a message with the request's context extended by `extra`.
    ///
    /// Keys in `extra` override the standard keys.
    pub fn add_log_entry_with(&self, level: LogLevel, message: &str, extra: LogContext) {
        let mut context = self.log_context();
        context.extend(extra);
        self.logger.log(level, message, &context);
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::MemoryLogger;
    use crate::request::ParameterBag;

    fn envelope(request: Request) -> (Envelope, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        (Envelope::new(request, logger.clone()), logger)
    }

    #[test]
    fn exposes_the_request() {
        let request = Request::get("http://foo.com/").build().unwrap();
        let (envelope, _) = envelope(request);

        assert_eq!(envelope.request().uri(), "http://foo.com/");
    }

    #[test]
    fn fully_loaded_request_adds_headers_to_the_context() {
        let request = Request::get("/?bar=baz&qux=quux")
            .header("Host", "foo.com")
            .header("User-Agent", "garply")
            .header("Referer", "grault")
            .build()
            .unwrap();
        let (envelope, logger) = envelope(request);

        envelope.add_log_entry(LogLevel::Warning, "The request looks suspicious.");

        let records = logger.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, LogLevel::Warning);
        assert_eq!(record.message, "The request looks suspicious.");
        assert_eq!(record.context["request_method"], "GET");
        assert_eq!(record.context["uri"], "http://foo.com/?bar=baz&qux=quux");
        assert_eq!(record.context["user_agent"], "garply");
        assert_eq!(record.context["referer"], "grault");
        assert!(!record.context.contains_key("parameters"));
    }

    #[test]
    fn minimal_request_omits_optional_keys() {
        let request = Request::get("http://foo.com/?bar=baz").build().unwrap();
        let (envelope, logger) = envelope(request);

        envelope.add_log_entry(LogLevel::Emergency, "The request looks suspicious.");

        let context = &logger.records()[0].context;
        assert!(!context.contains_key("user_agent"));
        assert!(!context.contains_key("referer"));
        assert!(!context.contains_key("parameters"));
        assert_eq!(
            context.contains_key("host_name"),
            sysinfo::System::host_name().is_some()
        );
    }

    #[test]
    fn body_parameters_are_added_to_the_context() {
        let body: ParameterBag = [("foo", "bar"), ("baz", "qux")].into_iter().collect();
        let request = Request::post("http://foo.com/")
            .build()
            .unwrap()
            .with_body_parameters(body);
        let (envelope, logger) = envelope(request);

        envelope.add_log_entry(LogLevel::Emergency, "The request looks suspicious.");

        let context = &logger.records()[0].context;
        assert_eq!(context["request_method"], "POST");
        assert_eq!(
            context["parameters"],
            serde_json::json!({ "foo": "bar", "baz": "qux" })
        );
    }

    #[test]
    fn extra_context_is_merged() {
        let request = Request::get("http://foo.com/?id=x").build().unwrap();
        let (envelope, logger) = envelope(request);

        let mut extra = LogContext::new();
        extra.insert("parameter".to_string(), "query.id".into());
        envelope.add_log_entry_with(LogLevel::Notice, "bad id", extra);

        let context = &logger.records()[0].context;
        assert_eq!(context["parameter"], "query.id");
        assert_eq!(context["uri"], "http://foo.com/?id=x");
    }
}
