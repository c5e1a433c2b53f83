//! User model for the signed-in actor and the auth payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in user as held by the client and persisted under `currentUser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user ID, as text
    pub id: String,
    pub email: String,
    /// Display name
    pub name: String,
    /// Never populated on the client; kept so stored records keep their shape
    #[serde(default)]
    pub password: String,
    /// When the account was created
    #[serde(with = "crate::time_utils::iso")]
    pub created_at: DateTime<Utc>,
}

/// Login form payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration payload, serialized with the backend's field names.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_privacy_policy: bool,
}
