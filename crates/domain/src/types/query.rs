//! Predefined (server-side) queries

use serde::{Deserialize, Serialize};

/// A named JPQL query registered on the server for an entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredefinedQuery {
    pub name: Option<String>,
    pub jpql: Option<String>,
    pub entity_name: Option<String>,
    pub view_name: Option<String>,
    #[serde(default)]
    pub params: Vec<QueryParameter>,
}

/// Parameter accepted by a [`PredefinedQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub description: Option<String>,
}
