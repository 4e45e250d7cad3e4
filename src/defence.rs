use std::fmt;

use crate::chain::FilterChain;
use crate::envelope::Envelope;
use crate::handler::Handler;

/// Runs a filter chain against each request and hands suspicious requests to
/// a handler.
///
/// Both collaborators are injected at construction and fixed afterwards, so a
/// single `Defence` can be shared by every request a server processes.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use request_defence::{
///     Defence, Envelope, FilterChain, FilterOptions, MemoryLogger, NoopHandler, Request,
///     SuspiciousUserAgentHeaderFilter,
/// };
///
/// let defence = Defence::new(
///     FilterChain::new().with_filter(SuspiciousUserAgentHeaderFilter::new(FilterOptions::new())),
///     NoopHandler,
/// );
///
/// let logger = Arc::new(MemoryLogger::new());
/// let request = Request::get("http://foo.com/").header("User-Agent", "-").build().unwrap();
///
/// assert!(defence.execute(&Envelope::new(request, logger.clone())));
/// assert_eq!(logger.messages(), vec!["The request has a suspicious UA string."]);
/// ```
pub struct Defence {
    filter_chain: FilterChain,
    handler: Box<dyn Handler>,
}

impl Defence {
    /// Creates a defence from a chain and a handler.
    pub fn new(filter_chain: FilterChain, handler: impl Handler + 'static) -> Self {
        Self {
            filter_chain,
            handler: Box::new(handler),
        }
    }

    /// Returns the filter chain.
    pub fn filter_chain(&self) -> &FilterChain {
        &self.filter_chain
    }

    /// Returns the handler.
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    /// Checks one request.
    ///
    /// Runs the chain, stopping at the first filter that finds the request
    /// suspicious, and if one did, invokes the handler exactly once. Returns
    /// whether the request was found suspicious.
    pub fn execute(&self, envelope: &Envelope) -> bool {
        let suspicious = self.filter_chain.execute(envelope, true);

        if suspicious {
            tracing::warn!(
                method = %envelope.request().method(),
                uri = %envelope.request().uri(),
                "suspicious request, invoking handler"
            );
            self.handler.handle(envelope);
        }

        suspicious
    }
}

impl fmt::Debug for Defence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defence")
            .field("filter_chain", &self.filter_chain)
            .finish_non_exhaustive()
    }
}
