//! Intrusion detection and prevention for inbound HTTP requests.
//!
//! A [`Defence`] runs each request through a [`FilterChain`]: an ordered list
//! of [`Filter`]s, each answering whether the request looks suspicious. The
//! first filter that says yes stops the chain, records why through the
//! request's [`Logger`], and the defence hands the request to its [`Handler`],
//! which may reject it outright.
//!
//! # Core Types
//!
//! - [`Envelope`]: one request plus the logger findings are reported to
//! - [`Filter`]: a single check, with built-in filters for headers, parameters and method overrides
//! - [`FilterChain`]: filters in evaluation order, with short-circuiting
//! - [`Handler`]: the reaction to a suspicious request
//! - [`Defence`]: a chain and a handler
//!
//! Filters, chains and defences are built once, validated eagerly, and shared
//! by every request. Evaluating a request never fails.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use request_defence::{
//!     factory, Defence, Envelope, FilterChain, FilterOptions, InvalidMethodOverrideFilter,
//!     MemoryLogger, NoopHandler, ParameterFilterOptions, Request, Selector,
//! };
//!
//! let chain = FilterChain::new()
//!     .with_filter(factory::strict_user_agent_header_filter(FilterOptions::new()))
//!     .with_filter(factory::iso8601_date_parameter_filter(
//!         Selector::names(["starts_on", "ends_on"]).unwrap(),
//!         ParameterFilterOptions::new(),
//!     ))
//!     .with_filter(InvalidMethodOverrideFilter::new(FilterOptions::new()));
//!
//! let defence = Defence::new(chain, NoopHandler);
//! let logger = Arc::new(MemoryLogger::new());
//!
//! let request = Request::get("http://example.com/events?starts_on=2020-03-12")
//!     .header("User-Agent", "Mozilla/5.0")
//!     .build()
//!     .unwrap();
//! assert!(!defence.execute(&Envelope::new(request, logger.clone())));
//!
//! let request = Request::get("http://example.com/events?starts_on=yesterday")
//!     .header("User-Agent", "Mozilla/5.0")
//!     .build()
//!     .unwrap();
//! assert!(defence.execute(&Envelope::new(request, logger.clone())));
//! assert_eq!(
//!     logger.messages(),
//!     vec!["The value of `query.starts_on` failed validation using the regex `^(\\d{4}-\\d{2}-\\d{2}|)$`."]
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chain;
pub mod config;
mod defence;
mod envelope;
mod error;
pub mod factory;
mod filter;
mod handler;
mod logger;
mod request;

pub use chain::FilterChain;
pub use config::{DefenceConfig, FilterConfig};
pub use defence::Defence;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use filter::{
    BannedUserAgentHeaderFilter, BlankUserAgentHeaderFilter, Filter, FilterOptions,
    InvalidHeaderFilter, InvalidMethodOverrideFilter, InvalidParameterFilter,
    InvalidParameterShapeFilter, ParameterFilterOptions, ParameterShape, ParameterType,
    SelectedParameter, Selector, SuspiciousUserAgentHeaderFilter, METHOD_OVERRIDE_HEADER,
    VALID_OVERRIDE_METHODS,
};
pub use handler::{
    forbidden_response, Handler, NoopHandler, ProcessExit, Responder, StdoutResponder,
    TerminateHandler, Terminator, FORBIDDEN_CONTENT,
};
pub use logger::{
    LogContext, LogLevel, LogRecord, Logger, MemoryLogger, NullLogger, SlackLogger,
    TracingLogger, UreqTransport, WebhookTransport,
};
pub use request::{ParameterBag, ParameterScope, ParameterValue, Request, RequestBuilder};
