use serde::{Deserialize, Serialize};

use crate::services::permission_evaluator::Role;

/// JWT claim set issued on login.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}
