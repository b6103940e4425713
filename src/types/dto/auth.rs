use poem_openapi::Object;
use serde::{Deserialize, Serialize};

use crate::types::dto::user::UserResponse;

/// Request model for user login
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email address
    pub username: String,

    /// Password for authentication
    pub password: String,
}

/// Response model containing the session token
#[derive(Object, Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed JWT for API authentication
    pub token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Number of seconds until the token expires
    pub expires_in: i64,

    /// The authenticated user
    pub user: UserResponse,
}
