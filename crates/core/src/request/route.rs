//! Route: method, path template and parameters of one API call
//!
//! `{name}` placeholders in the template are filled from the path
//! parameters. Text values are percent-encoded, identifiers and numbers are
//! inserted verbatim. The query string is appended after substitution, so
//! braces inside query values are never treated as placeholders.

use std::borrow::Cow;
use std::fmt;

use tracing::warn;
use uuid::Uuid;

use super::query::QueryParams;
use crate::http::ports::HttpMethod;

/// A path parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Percent-encoded on substitution.
    Text(String),
    /// Inserted as-is (numbers, UUIDs, entity identifiers).
    Raw(String),
}

impl ParamValue {
    /// Percent-encoded value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Value inserted verbatim.
    pub fn raw(value: impl fmt::Display) -> Self {
        Self::Raw(value.to_string())
    }

    fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Text(value) => urlencoding::encode(value),
            Self::Raw(value) => Cow::Borrowed(value.as_str()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for ParamValue {
    fn from(value: Uuid) -> Self {
        Self::raw(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::raw(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::raw(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::raw(value)
    }
}

/// An unresolved API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    method: HttpMethod,
    path: String,
    params: Vec<(String, ParamValue)>,
    query: QueryParams,
    sensitive: bool,
}

impl Route {
    /// Route for `method` on the `path` template.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            query: QueryParams::new(),
            sensitive: false,
        }
    }

    /// `GET` route.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` route.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// `PUT` route.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// `DELETE` route.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Bind a `{name}` placeholder.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Query string appended after placeholder substitution.
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// The query string carries secrets; hide it when the route is displayed.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters.
    pub fn query_params(&self) -> &QueryParams {
        &self.query
    }

    /// Substitute placeholders and append the query string.
    pub fn resolve(&self, base_url: &str) -> ResolvedRoute {
        let mut url = resolve(base_url, &self.path, &self.params);
        url.push_str(&self.query.to_query_string());
        ResolvedRoute { method: self.method, url, sensitive: self.sensitive }
    }
}

/// A route bound to a concrete URL
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub method: HttpMethod,
    pub url: String,
    pub sensitive: bool,
}

impl ResolvedRoute {
    /// Route bound to `url`.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), sensitive: false }
    }

    /// URL safe for logs and error messages.
    pub fn display_url(&self) -> Cow<'_, str> {
        match self.url.split_once('?') {
            Some((path, _)) if self.sensitive => Cow::Owned(format!("{path}?[REDACTED]")),
            _ => Cow::Borrowed(self.url.as_str()),
        }
    }
}

impl fmt::Display for ResolvedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.display_url())
    }
}

impl fmt::Debug for ResolvedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedRoute")
            .field("method", &self.method)
            .field("url", &self.display_url())
            .finish()
    }
}

/// Join `base_url` and `template`, substituting every `{name}` placeholder.
///
/// A placeholder without a matching parameter stays in the URL verbatim and
/// is logged.
pub fn resolve(base_url: &str, template: &str, params: &[(String, ParamValue)]) -> String {
    let mut url = String::with_capacity(base_url.len() + template.len());
    url.push_str(base_url);

    let mut rest = template;
    while let Some(open) = rest.find('{') {
        url.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            url.push_str(&rest[open..]);
            return url;
        };

        let name = &after[..close];
        match params.iter().find(|(key, _)| key == name) {
            Some((_, value)) => url.push_str(&value.render()),
            None => {
                warn!(placeholder = name, template, "route placeholder has no parameter");
                url.push('{');
                url.push_str(name);
                url.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    url.push_str(rest);
    url
}
