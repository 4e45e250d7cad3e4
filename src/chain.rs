use std::fmt;

use crate::envelope::Envelope;
use crate::filter::Filter;

/// An ordered sequence of filters.
///
/// Filters run in the order they were added. The same filter may be added more
/// than once.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use request_defence::{
///     Envelope, FilterChain, FilterOptions, NullLogger, Request, SuspiciousUserAgentHeaderFilter,
/// };
///
/// let chain = FilterChain::new()
///     .with_filter(SuspiciousUserAgentHeaderFilter::new(FilterOptions::new()));
///
/// let envelope = Envelope::new(Request::get("/").build().unwrap(), Arc::new(NullLogger));
/// assert!(chain.execute(&envelope, true));
/// ```
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn append(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Appends an already boxed filter.
    pub fn append_boxed(&mut self, filter: Box<dyn Filter>) -> &mut Self {
        self.filters.push(filter);
        self
    }

    /// Appends a filter, consuming and returning the chain.
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.append(filter);
        self
    }

    /// Returns the filters, in evaluation order.
    pub fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs the filters against `envelope`.
    ///
    /// Returns `true` if any filter found the request suspicious. With
    /// `break_on_first_true`, evaluation stops at the first such filter and
    /// the rest are never invoked; otherwise every filter runs, so every
    /// finding is logged. An empty chain returns `false`.
    pub fn execute(&self, envelope: &Envelope, break_on_first_true: bool) -> bool {
        let mut suspicious = false;

        for (position, filter) in self.filters.iter().enumerate() {
            let result = filter.evaluate(envelope);
            tracing::debug!(filter = filter.name(), position, suspicious = result, "filter evaluated");

            if result {
                suspicious = true;
                if break_on_first_true {
                    break;
                }
            }
        }

        suspicious
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}

impl<F: Filter + 'static> Extend<F> for FilterChain {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        for filter in iter {
            self.append(filter);
        }
    }
}

impl FromIterator<Box<dyn Filter>> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Box<dyn Filter>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
