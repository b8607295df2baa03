//! Framework-neutral request inputs consumed by the pipeline.
//!
//! This crate does not bind to a concrete HTTP framework. The host service
//! translates its native request into an [`EndpointRequest`] before handing
//! it to the pipeline: the raw verb, headers, an established-session marker,
//! and the query-string and parsed-body pairs.

use std::collections::HashMap;
use std::fmt;

/// HTTP method an endpoint is mounted under, declared via `-- @method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    /// Get the method name as an HTTP verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }

    /// Case-insensitive comparison against a raw request verb.
    pub fn matches(&self, verb: &str) -> bool {
        verb.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One incoming request, reduced to what the pipeline consumes.
///
/// Header names are stored lower-cased; header values are kept verbatim.
/// Query and body values are raw strings — coercion happens later, against
/// the parameter catalog. Repeated names keep every occurrence; the pipeline
/// takes the first.
#[derive(Debug, Clone, Default)]
pub struct EndpointRequest {
    verb: String,
    headers: HashMap<String, String>,
    session: bool,
    query: Vec<(String, String)>,
    body: Vec<(String, String)>,
}

impl EndpointRequest {
    /// Create a request with the given raw verb.
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            ..Self::default()
        }
    }

    /// Shorthand for a GET request.
    pub fn get() -> Self {
        Self::new("GET")
    }

    /// Shorthand for a POST request.
    pub fn post() -> Self {
        Self::new("POST")
    }

    /// Attach a header. Names are case-insensitive.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Mark the request as carrying an established session.
    pub fn with_session(mut self) -> Self {
        self.session = true;
        self
    }

    /// Append a query-string pair.
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Append a parsed-body pair.
    pub fn with_body_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.body.push((name.into(), value.into()));
        self
    }

    /// The raw request verb.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the request carries an established session marker.
    pub fn has_session(&self) -> bool {
        self.session
    }

    /// Read a parameter value from the source matching the endpoint method:
    /// query string for GET, parsed body for POST. The first occurrence wins
    /// when a name repeats.
    pub fn value(&self, source: HttpMethod, name: &str) -> Option<&str> {
        let pairs = match source {
            HttpMethod::Get => &self.query,
            HttpMethod::Post => &self.body,
        };
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
