//! The inbound HTTP request as seen by filters.
//!
//! Filters never touch a framework's request type directly. They read a
//! [`Request`], which exposes exactly what they need: headers, the two
//! parameter scopes (query string and body), the real HTTP method and the URI.
//!
//! A `Request` can be assembled by hand with [`Request::builder`] or converted
//! from `http` crate parts, in which case the query scope is parsed from the
//! URI. Body parameters are decoded by the surrounding application and attached
//! with [`Request::with_body_parameters`].

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

use crate::error::{Error, Result};

/// The value of a request parameter.
///
/// A parameter is either a plain string (`?id=1`) or a list of strings
/// (`?id[]=1&id[]=2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// A single string value
    Scalar(String),
    /// Several values submitted under one name
    List(Vec<String>),
}

impl ParameterValue {
    /// Returns `true` if this is a list value.
    pub fn is_list(&self) -> bool {
        matches!(self, ParameterValue::List(_))
    }

    /// Returns the scalar value, or `None` for a list.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ParameterValue::Scalar(value) => Some(value),
            ParameterValue::List(_) => None,
        }
    }

    /// Iterates over the value, or over each element of a list, in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            ParameterValue::Scalar(value) => std::slice::from_ref(value),
            ParameterValue::List(values) => values,
        };

        values.iter().map(String::as_str)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Scalar(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for ParameterValue {
    fn from(values: Vec<S>) -> Self {
        ParameterValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// One of the two independent parameter namespaces of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterScope {
    /// Parameters from the query string
    Query,
    /// Parameters from the request body
    Body,
}

impl ParameterScope {
    /// All scopes, in the order filters evaluate them.
    pub const ALL: [ParameterScope; 2] = [ParameterScope::Query, ParameterScope::Body];

    /// Returns the name used in log messages (`query` or `body`).
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterScope::Query => "query",
            ParameterScope::Body => "body",
        }
    }
}

impl fmt::Display for ParameterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An insertion-ordered collection of named parameters.
///
/// Order matters: filters report the first offending parameter they meet, so
/// the bag must iterate in the order parameters were submitted. Lookups and
/// inserts go through a name index and take constant time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "serde_json::Map<String, serde_json::Value>")]
pub struct ParameterBag {
    entries: Vec<(String, ParameterValue)>,
    positions: HashMap<String, usize>,
}

impl ParameterBag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// Names and values are percent-decoded and `+` is read as a space. A
    /// name with a bracketed suffix (`id[]`, `id[0]`, `id[key]`, `id[a][b]`)
    /// is collected into a [`ParameterValue::List`] under its base name (`id`)
    /// in submission order; a plain name that repeats keeps its last value.
    ///
    /// # Examples
    ///
    /// ```
    /// use request_defence::{ParameterBag, ParameterValue};
    ///
    /// let bag = ParameterBag::from_query_string("q=red+shoes&id[]=1&id[]=2");
    ///
    /// assert_eq!(bag.get("q"), Some(&ParameterValue::from("red shoes")));
    /// assert_eq!(bag.get("id"), Some(&ParameterValue::from(vec!["1", "2"])));
    /// ```
    pub fn from_query_string(query: &str) -> Self {
        let mut bag = Self::new();

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (raw_name, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = form_decode(raw_name);
            let value = form_decode(raw_value);

            match list_base_name(&name) {
                Some(base_name) => bag.push(base_name, value),
                None => bag.set(name, value),
            }
        }

        bag
    }

    /// Sets a parameter, replacing any existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        let name = name.into();
        let value = value.into();

        match self.positions.get(&name) {
            Some(&position) => self.entries[position].1 = value,
            None => self.insert(name, value),
        }
    }

    /// Appends a value to a list parameter, creating the list if needed.
    ///
    /// A scalar already stored under `name` is replaced by a new list.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.positions.get(&name) {
            Some(&position) => match &mut self.entries[position].1 {
                ParameterValue::List(values) => values.push(value),
                scalar => *scalar = ParameterValue::List(vec![value]),
            },
            None => self.insert(name, ParameterValue::List(vec![value])),
        }
    }

    fn insert(&mut self, name: String, value: ParameterValue) {
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
    }

    /// Returns the value of a parameter, if present.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.positions
            .get(name)
            .map(|&position| &self.entries[position].1)
    }

    /// Returns `true` if a parameter with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over parameter names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the bag holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for ParameterBag
where
    N: Into<String>,
    V: Into<ParameterValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (name, value) in iter {
            bag.set(name, value);
        }
        bag
    }
}

impl From<ParameterBag> for serde_json::Map<String, serde_json::Value> {
    fn from(bag: ParameterBag) -> Self {
        bag.entries
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    ParameterValue::Scalar(value) => serde_json::Value::String(value),
                    ParameterValue::List(values) => values.into_iter().collect(),
                };
                (name, value)
            })
            .collect()
    }
}

/// Returns the base name of a bracketed list name: `id` for `id[]`, `id[0]`
/// or `id[a][b]`. Names without a closed bracket suffix, or with nothing
/// before the first bracket, are not list names.
fn list_base_name(name: &str) -> Option<&str> {
    if !name.ends_with(']') {
        return None;
    }

    match name.find('[') {
        Some(open) if open > 0 => Some(&name[..open]),
        _ => None,
    }
}

/// Decodes one `x-www-form-urlencoded` component.
fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");

    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // Invalid UTF-8 is decoded lossily
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned(),
    }
}

/// An inbound HTTP request.
///
/// # Examples
///
/// ```
/// use request_defence::{ParameterScope, Request};
///
/// let request = Request::builder()
///     .uri("http://example.com/articles?id=42")
///     .header("User-Agent", "Mozilla/5.0")
///     .build()
///     .expect("valid request");
///
/// assert_eq!(request.header("user-agent").as_deref(), Some("Mozilla/5.0"));
/// assert!(request.parameters(ParameterScope::Query).contains("id"));
/// assert_eq!(request.uri(), "http://example.com/articles?id=42");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: ParameterBag,
    body: ParameterBag,
}

impl Request {
    /// Starts building a request. The defaults are `GET /` with no headers.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Starts building a `GET` request for `uri`.
    pub fn get(uri: &str) -> RequestBuilder {
        RequestBuilder::new().uri(uri)
    }

    /// Starts building a `POST` request for `uri`.
    pub fn post(uri: &str) -> RequestBuilder {
        RequestBuilder::new().method("POST").uri(uri)
    }

    /// Creates a request from `http` crate parts.
    ///
    /// The query scope is parsed from the URI; the body scope starts empty.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            query: parts
                .uri
                .query()
                .map(ParameterBag::from_query_string)
                .unwrap_or_default(),
            body: ParameterBag::new(),
        }
    }

    /// Replaces the body scope with already-decoded body parameters.
    pub fn with_body_parameters(mut self, body: ParameterBag) -> Self {
        self.body = body;
        self
    }

    /// Returns the value of a header, looked up case-insensitively.
    ///
    /// Values that are not valid UTF-8 are decoded lossily rather than being
    /// reported as absent.
    pub fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers
            .get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
    }

    /// Returns all headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the parameters of one scope.
    pub fn parameters(&self, scope: ParameterScope) -> &ParameterBag {
        match scope {
            ParameterScope::Query => &self.query,
            ParameterScope::Body => &self.body,
        }
    }

    /// Returns the query-string parameters.
    pub fn query(&self) -> &ParameterBag {
        &self.query
    }

    /// Returns the body parameters.
    pub fn body(&self) -> &ParameterBag {
        &self.body
    }

    /// Returns the method the request was actually made with.
    ///
    /// This is never affected by a method override.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the absolute URI of the request.
    ///
    /// A relative request target is resolved against the `Host` header when
    /// one is present.
    pub fn uri(&self) -> String {
        if self.uri.scheme().is_some() {
            return self.uri.to_string();
        }

        let path_and_query = self
            .uri
            .path_and_query()
            .map_or("/", |path_and_query| path_and_query.as_str());

        match self.header("host") {
            Some(host) => format!("http://{}{}", host, path_and_query),
            None => path_and_query.to_string(),
        }
    }
}

impl<B> From<&http::Request<B>> for Request {
    fn from(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            query: request
                .uri()
                .query()
                .map(ParameterBag::from_query_string)
                .unwrap_or_default(),
            body: ParameterBag::new(),
        }
    }
}

/// Builder for [`Request`].
///
/// Like `http::request::Builder`, errors are deferred: the first invalid part
/// is reported by [`build`](Self::build).
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: Vec<(String, ParameterValue)>,
    body: ParameterBag,
    error: Option<Error>,
}

impl RequestBuilder {
    fn new() -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: ParameterBag::new(),
            error: None,
        }
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Sets the real HTTP method (e.g. `"POST"`).
    pub fn method(mut self, method: &str) -> Self {
        match Method::from_bytes(method.as_bytes()) {
            Ok(method) => self.method = method,
            Err(_) => self.fail(Error::InvalidRequest(format!("invalid method `{}`", method))),
        }
        self
    }

    /// Sets the URI. Its query string populates the query scope.
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.parse::<Uri>() {
            Ok(uri) => self.uri = uri,
            Err(err) => self.fail(Error::InvalidRequest(format!("invalid URI `{}`: {}", uri, err))),
        }
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = match HeaderName::from_bytes(name.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                self.fail(Error::InvalidRequest(format!("invalid header name `{}`", name)));
                return self;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.append(name, value);
            }
            Err(_) => self.fail(Error::InvalidRequest(format!(
                "invalid value for header `{}`",
                name
            ))),
        }
        self
    }

    /// Sets a query parameter, overriding any parsed from the URI.
    pub fn query_param(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    /// Sets a body parameter.
    pub fn body_param(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.body.set(name, value);
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for the first invalid method, URI or
    /// header supplied to the builder.
    pub fn build(self) -> Result<Request> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut query = self
            .uri
            .query()
            .map(ParameterBag::from_query_string)
            .unwrap_or_default();
        for (name, value) in self.query {
            query.set(name, value);
        }

        Ok(Request {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            query,
            body: self.body,
        })
    }
}
