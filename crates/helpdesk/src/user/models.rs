//! User data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::{Identity, Role};

/// User entity from database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl User {
    /// Identity carried in this user's session tokens.
    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            email: self.email.clone(),
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

/// Public user info (safe to return to clients).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub role: Role,
}

impl From<Identity> for UserInfo {
    fn from(identity: Identity) -> Self {
        Self {
            role: identity.role(),
            username: identity.username,
            email: identity.email,
            is_staff: identity.is_staff,
            is_superuser: identity.is_superuser,
        }
    }
}

/// Request to create a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    /// Never accepted over HTTP; set by the CLI bootstrap only.
    #[serde(skip)]
    pub is_superuser: bool,
}
