//! Paging and projection options for list, search and query calls
//!
//! Every field is optional; unset fields are omitted from the request rather
//! than sent with a default value.

use serde::{Deserialize, Serialize};

use crate::constants::MAX_PAGE_LIMIT;
use crate::errors::{NjunsError, Result};

/// Reject page sizes above the server cap.
///
/// # Errors
/// Returns `NjunsError::InvalidInput` when `limit` exceeds 50.
pub fn validate_limit(limit: Option<u32>) -> Result<()> {
    match limit {
        Some(limit) if limit > MAX_PAGE_LIMIT => Err(NjunsError::InvalidInput(format!(
            "limit must be less than or equal to {MAX_PAGE_LIMIT}, got {limit}"
        ))),
        _ => Ok(()),
    }
}

/// Options for listing or searching entities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    /// Name of the view used to load each entity.
    pub view: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Property to sort by; a leading `-` sorts descending, `+` or nothing ascending.
    pub sort: Option<String>,
    pub return_nulls: Option<bool>,
    /// Ask the server for the total in the `X-Total-Count` header.
    pub return_count: Option<bool>,
    pub dynamic_attributes: Option<bool>,
}

/// Entity search takes the same knobs as a plain listing.
pub type SearchOptions = ListOptions;

impl ListOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// View to render.
    #[must_use]
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Page size, at most 50.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sort property, `-` prefix for descending.
    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Include null attributes.
    #[must_use]
    pub fn return_nulls(mut self, value: bool) -> Self {
        self.return_nulls = Some(value);
        self
    }

    /// Ask for the total count.
    #[must_use]
    pub fn return_count(mut self, value: bool) -> Self {
        self.return_count = Some(value);
        self
    }

    /// Include dynamic attributes.
    #[must_use]
    pub fn dynamic_attributes(mut self, value: bool) -> Self {
        self.dynamic_attributes = Some(value);
        self
    }

    /// # Errors
    /// See [`validate_limit`].
    pub fn validate(&self) -> Result<()> {
        validate_limit(self.limit)
    }
}

/// Options for loading a single entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOptions {
    pub view: Option<String>,
    pub dynamic_attributes: Option<bool>,
}

impl EntityOptions {
    /// View to render.
    #[must_use]
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Include dynamic attributes.
    #[must_use]
    pub fn dynamic_attributes(mut self, value: bool) -> Self {
        self.dynamic_attributes = Some(value);
        self
    }
}

/// Options for executing a predefined query
///
/// No `sort`: ordering is fixed by the query's JPQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub view: Option<String>,
    pub return_nulls: Option<bool>,
    pub return_count: Option<bool>,
    pub dynamic_attributes: Option<bool>,
}

impl QueryOptions {
    /// Page size, at most 50.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rows to skip.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// View to render.
    #[must_use]
    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Include null attributes.
    #[must_use]
    pub fn return_nulls(mut self, value: bool) -> Self {
        self.return_nulls = Some(value);
        self
    }

    /// Ask for the total count.
    #[must_use]
    pub fn return_count(mut self, value: bool) -> Self {
        self.return_count = Some(value);
        self
    }

    /// Include dynamic attributes.
    #[must_use]
    pub fn dynamic_attributes(mut self, value: bool) -> Self {
        self.dynamic_attributes = Some(value);
        self
    }

    /// # Errors
    /// See [`validate_limit`].
    pub fn validate(&self) -> Result<()> {
        validate_limit(self.limit)
    }
}
