//! Logged-in user profile, as returned by `GET /userInfo`

use serde::{Deserialize, Serialize};

/// Profile of the user owning the current session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Option<String>,
    pub login: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
    pub time_zone: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
    #[serde(rename = "_instanceName")]
    pub instance_name: Option<String>,
}

impl UserInfo {
    /// Best human-readable label: display name, then login.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.instance_name.as_deref()).or(self.login.as_deref())
    }
}
