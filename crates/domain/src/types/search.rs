//! Entity search filter conditions
//!
//! A search filter is a list of conditions. Each condition is either a leaf
//! predicate `{property, operator, value}` or a group
//! `{group: "AND"|"OR", conditions: [...]}` nesting further conditions.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::{NjunsError, Result};

/// Comparison operator of a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "notEmpty")]
    NotEmpty,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "notin")]
    NotIn,
}

impl SearchOperator {
    /// Every operator, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Eq,
        Self::NotEq,
        Self::Lt,
        Self::LtEq,
        Self::Gt,
        Self::GtEq,
        Self::StartsWith,
        Self::EndsWith,
        Self::Contains,
        Self::NotEmpty,
        Self::In,
        Self::NotIn,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::Contains => "contains",
            Self::NotEmpty => "notEmpty",
            Self::In => "in",
            Self::NotIn => "notin",
        }
    }

    /// `in` and `notin` compare against a JSON array.
    pub fn requires_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchOperator {
    type Err = NjunsError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == value)
            .ok_or_else(|| NjunsError::InvalidInput(format!("unknown search operator '{value}'")))
    }
}

/// Boolean combinator of a condition group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchGroup {
    And,
    Or,
}

/// One node of a search condition tree
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SearchCondition {
    Group {
        group: SearchGroup,
        conditions: Vec<SearchCondition>,
    },
    Leaf {
        property: String,
        operator: SearchOperator,
        #[serde(default)]
        value: Value,
    },
}

/// Leaves always carry `value`, except a `notEmpty` leaf without one.
impl Serialize for SearchCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Group { group, conditions } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("group", group)?;
                map.serialize_entry("conditions", conditions)?;
                map.end()
            }
            Self::Leaf { property, operator, value } => {
                let omit_value = *operator == SearchOperator::NotEmpty && value.is_null();
                let mut map = serializer.serialize_map(Some(if omit_value { 2 } else { 3 }))?;
                map.serialize_entry("property", property)?;
                map.serialize_entry("operator", operator)?;
                if !omit_value {
                    map.serialize_entry("value", value)?;
                }
                map.end()
            }
        }
    }
}

impl SearchCondition {
    /// Leaf predicate.
    ///
    /// # Errors
    /// Returns `NjunsError::InvalidInput` when the property is blank or when
    /// `in`/`notin` is given a non-array value.
    pub fn leaf(
        property: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let condition =
            Self::Leaf { property: property.into(), operator, value: value.into() };
        condition.validate()?;
        Ok(condition)
    }

    /// Group of child conditions.
    ///
    /// # Errors
    /// Returns `NjunsError::InvalidInput` when `conditions` is empty or any
    /// child is invalid.
    pub fn group(group: SearchGroup, conditions: Vec<SearchCondition>) -> Result<Self> {
        let condition = Self::Group { group, conditions };
        condition.validate()?;
        Ok(condition)
    }

    /// # Errors
    /// See [`SearchCondition::group`].
    pub fn and(conditions: Vec<SearchCondition>) -> Result<Self> {
        Self::group(SearchGroup::And, conditions)
    }

    /// # Errors
    /// See [`SearchCondition::group`].
    pub fn or(conditions: Vec<SearchCondition>) -> Result<Self> {
        Self::group(SearchGroup::Or, conditions)
    }

    /// Whether this node groups other conditions.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// Recursively check the tree.
    ///
    /// # Errors
    /// Returns `NjunsError::InvalidInput` naming the offending node.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Group { conditions, .. } => {
                if conditions.is_empty() {
                    return Err(NjunsError::InvalidInput(
                        "child conditions must be specified when grouping".to_string(),
                    ));
                }
                conditions.iter().try_for_each(Self::validate)
            }
            Self::Leaf { property, operator, value } => {
                if property.trim().is_empty() {
                    return Err(NjunsError::InvalidInput(
                        "search condition property must not be empty".to_string(),
                    ));
                }
                if operator.requires_list() && !value.is_array() {
                    return Err(NjunsError::InvalidInput(format!(
                        "value for '{property}' must be a list when using the '{operator}' operator"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// The `filter` object of a search request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub conditions: Vec<SearchCondition>,
}

impl SearchFilter {
    /// Filter over `conditions`.
    pub fn new(conditions: Vec<SearchCondition>) -> Self {
        Self { conditions }
    }

    /// # Errors
    /// Returns the first invalid condition's error.
    pub fn validate(&self) -> Result<()> {
        self.conditions.iter().try_for_each(SearchCondition::validate)
    }
}
