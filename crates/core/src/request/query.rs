//! Query-string assembly
//!
//! Values are inserted as given; [`QueryParams::text`] is the one helper
//! that percent-encodes, for free text such as ticket comments.

use std::fmt::Display;

/// A query parameter value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueryValue {
    /// Leave the parameter out.
    #[default]
    Absent,
    /// Send the name with an empty value (`name=`).
    Null,
    Value(String),
}

impl QueryValue {
    /// Whether the entry is left out of the query string.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: Display> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, |v| Self::Value(v.to_string()))
    }
}

/// Ordered query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter; order of insertion is kept.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a value rendered through `Display`, omitted when `None`.
    #[must_use]
    pub fn opt<T: Display>(self, name: impl Into<String>, value: Option<T>) -> Self {
        self.with(name, QueryValue::from(value))
    }

    /// Append percent-encoded free text, omitted when `None`.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: Option<&str>) -> Self {
        self.opt(name, value.map(|v| urlencoding::encode(v).into_owned()))
    }

    /// Append an entry in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First entry named `name`.
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    /// True when nothing would be rendered.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, value)| value.is_absent())
    }

    /// `?a=1&b=2`, or an empty string when nothing is set.
    pub fn to_query_string(&self) -> String {
        build_query_string(&self.entries)
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Value(value.to_string())
    }
}

/// Render `?k1=v1&k2=v2`, or `""` when every entry is absent.
pub fn build_query_string(entries: &[(String, QueryValue)]) -> String {
    let pairs: Vec<String> = entries
        .iter()
        .filter_map(|(name, value)| match value {
            QueryValue::Absent => None,
            QueryValue::Null => Some(format!("{name}=")),
            QueryValue::Value(text) => Some(format!("{name}={text}")),
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
