use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::services::permission_evaluator::Role;
use crate::types::db::user;

/// A user as exposed by the API. The password hash never leaves the
/// store layer.
#[derive(Object, Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,

    pub username: String,

    pub email: String,

    /// One of "super_admin", "admin", "sales"
    pub role: String,

    /// Numeric privilege rank (sales = 1, admin = 2, super_admin = 3)
    pub privilege_level: u8,

    /// Creation time (Unix timestamp, seconds)
    pub created_at: i64,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        let role = model.role.parse().unwrap_or(Role::Sales);
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: role.as_str().to_string(),
            privilege_level: role.privilege_level(),
            created_at: model.created_at,
        }
    }
}

/// Request model for creating a user
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// 3 to 20 characters
    pub username: String,

    pub email: String,

    /// At least 6 characters
    pub password: String,

    /// Defaults to "sales" when omitted
    pub role: Option<String>,
}

/// Request model for updating a user; omitted fields are left unchanged
#[derive(Object, Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,

    pub email: Option<String>,

    /// Re-hashed on arrival when supplied
    pub password: Option<String>,

    pub role: Option<String>,
}

/// One page of the user listing
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,

    /// Total matching users across all pages
    pub total: u64,

    pub page: u64,

    pub page_size: u64,

    pub total_pages: u64,
}
