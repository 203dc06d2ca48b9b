//! Generic entity record
//!
//! The server returns entities as JSON objects with a handful of system
//! fields (`id`, `_entityName`, `_instanceName`) plus whatever attributes the
//! requested view projects. The extra attributes are kept in insertion order.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::{NjunsError, Result};

/// An entity instance with an open-ended attribute bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "_entityName", default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(rename = "_instanceName", default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,

    /// Every other attribute of the payload.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Entity with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter, handy for `create_entity` payloads.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Attribute value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attribute as a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Attribute as a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Attribute as an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Nested entity reference (e.g. `ticket` on a wall entry).
    pub fn get_entity(&self, name: &str) -> Option<Entity> {
        match self.get(name) {
            Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }

    /// Deserialize one attribute into a caller-chosen type.
    ///
    /// Returns `Ok(None)` when the attribute is absent or JSON `null`.
    ///
    /// # Errors
    /// Returns `NjunsError::Serialization` when the value has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone()).map(Some).map_err(|e| {
                NjunsError::Serialization(format!("attribute '{name}' has unexpected shape: {e}"))
            }),
        }
    }

    /// Names of the extra attributes, in server order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// JSON representation sent to the create endpoint.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(id) = &self.id {
            object.insert("id".to_string(), Value::String(id.clone()));
        }
        for (name, value) in &self.attributes {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Ids are usually UUID strings, but integer-keyed entities exist.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
