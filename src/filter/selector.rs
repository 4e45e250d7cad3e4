//! Choosing which request parameters a filter inspects.

use regex::Regex;

use crate::error::{Error, Result};
use crate::request::{ParameterScope, ParameterValue, Request};

/// Which parameters a parameter filter inspects.
///
/// Either an explicit list of names or a regex matched against parameter
/// names. Both are resolved against the query scope first, then the body
/// scope; within a scope, parameters come in the order they were submitted.
///
/// # Example
///
/// ```
/// use request_defence::{Request, Selector};
///
/// let request = Request::get("/?post_id=1&page=2&user_id=3").build().unwrap();
///
/// let by_pattern = Selector::pattern(r"_id$").unwrap();
/// let names: Vec<_> = by_pattern.select(&request).map(|p| p.qualified_name()).collect();
/// assert_eq!(names, vec!["query.post_id", "query.user_id"]);
///
/// let by_name = Selector::names(["page"]).unwrap();
/// assert_eq!(by_name.select(&request).count(), 1);
/// ```
#[derive(Debug, Clone)]
pub enum Selector {
    /// Parameters with one of these names
    Names(Vec<String>),
    /// Parameters whose name matches this regex
    Pattern(Regex),
}

impl Selector {
    /// Selects parameters by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] if the list is empty or contains a
    /// blank name.
    pub fn names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate_names(names).map(Selector::Names)
    }

    /// Selects parameters whose name matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for an empty pattern and
    /// [`Error::InvalidPattern`] if it does not compile.
    pub fn pattern(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidSelector("the pattern is empty".to_string()));
        }

        Regex::new(pattern)
            .map(Selector::Pattern)
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Returns `true` if a parameter called `name` is selected.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Selector::Names(names) => names.iter().any(|selected| selected == name),
            Selector::Pattern(pattern) => pattern.is_match(name),
        }
    }

    /// Resolves the selector against a request.
    ///
    /// Yields the selected parameters of the query scope, then those of the
    /// body scope. Names that are not present contribute nothing.
    pub fn select<'a>(
        &'a self,
        request: &'a Request,
    ) -> impl Iterator<Item = SelectedParameter<'a>> + 'a {
        select_by(request, move |name| self.matches(name))
    }
}

/// Collects a non-empty list of non-blank parameter names.
pub(crate) fn validate_names<I, S>(names: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();

    if names.is_empty() {
        return Err(Error::InvalidSelector(
            "at least one parameter name is required".to_string(),
        ));
    }
    if names.iter().any(|name| name.trim().is_empty()) {
        return Err(Error::InvalidSelector(
            "parameter names cannot be blank".to_string(),
        ));
    }

    Ok(names)
}

/// Yields the query, then body, parameters whose name passes `matches`.
pub(crate) fn select_by<'a, P>(
    request: &'a Request,
    matches: P,
) -> impl Iterator<Item = SelectedParameter<'a>> + 'a
where
    P: Fn(&str) -> bool + Copy + 'a,
{
    ParameterScope::ALL.into_iter().flat_map(move |scope| {
        request
            .parameters(scope)
            .iter()
            .filter(move |&(name, _)| matches(name))
            .map(move |(name, value)| SelectedParameter { scope, name, value })
    })
}

/// A parameter picked out by a [`Selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedParameter<'a> {
    /// The scope the parameter was found in
    pub scope: ParameterScope,
    /// The parameter name
    pub name: &'a str,
    /// The parameter value
    pub value: &'a ParameterValue,
}

impl SelectedParameter<'_> {
    /// Returns `scope.name`, as used in log messages (e.g. `query.id`).
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.scope, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ParameterBag;

    fn request() -> Request {
        let body: ParameterBag = [("id", "7"), ("title", "x"), ("blog_id", "9")]
            .into_iter()
            .collect();

        Request::post("/?blog_id=2&id=1&page=3")
            .build()
            .unwrap()
            .with_body_parameters(body)
    }

    fn qualified(selector: &Selector, request: &Request) -> Vec<String> {
        selector
            .select(request)
            .map(|parameter| parameter.qualified_name())
            .collect()
    }

    #[test]
    fn names_select_query_then_body_in_submission_order() {
        let selector = Selector::names(["id", "blog_id"]).unwrap();

        assert_eq!(
            qualified(&selector, &request()),
            vec!["query.blog_id", "query.id", "body.id", "body.blog_id"]
        );
    }

    #[test]
    fn pattern_matches_parameter_names() {
        let selector = Selector::pattern(r"^(blog_)?id$").unwrap();

        assert_eq!(
            qualified(&selector, &request()),
            vec!["query.blog_id", "query.id", "body.id", "body.blog_id"]
        );
    }

    #[test]
    fn selection_keeps_the_scope_value() {
        let selector = Selector::names(["id"]).unwrap();
        let request = request();
        let selected: Vec<_> = selector.select(&request).collect();

        assert_eq!(selected[0].value, &ParameterValue::from("1"));
        assert_eq!(selected[0].scope, ParameterScope::Query);
        assert_eq!(selected[1].value, &ParameterValue::from("7"));
        assert_eq!(selected[1].scope, ParameterScope::Body);
    }

    #[test]
    fn absent_names_contribute_nothing() {
        let selector = Selector::names(["missing"]).unwrap();
        assert_eq!(selector.select(&request()).count(), 0);
    }

    #[test]
    fn rejects_empty_name_lists_and_blank_names() {
        assert!(matches!(
            Selector::names(Vec::<String>::new()),
            Err(Error::InvalidSelector(_))
        ));
        assert!(matches!(
            Selector::names(["id", " "]),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn select_by_applies_the_name_predicate_per_scope() {
        let request = request();
        let selected: Vec<_> = select_by(&request, |name| name.starts_with('b'))
            .map(|parameter| parameter.qualified_name())
            .collect();

        assert_eq!(selected, vec!["query.blog_id", "body.blog_id"]);
    }

    #[test]
    fn rejects_empty_and_malformed_patterns() {
        assert!(matches!(Selector::pattern(""), Err(Error::InvalidSelector(_))));
        assert!(matches!(
            Selector::pattern("(unclosed"),
            Err(Error::InvalidPattern { .. })
        ));
    }
}
