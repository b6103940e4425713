use std::sync::Arc;

use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use crate::errors::StoreError;
use crate::services::crypto;
use crate::services::permission_evaluator::Role;
use crate::services::token_service::TokenService;
use crate::stores::ensure_connected;
use crate::types::db::user;

/// Successful login: the signed token plus the user it was issued for.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Role,
    pub user: user::Model,
}

/// Verifies credentials and issues session tokens.
pub struct AuthService {
    db: DatabaseConnection,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }

    /// Log in with a username or email plus password.
    ///
    /// Every credential failure returns the same message; the caller must
    /// not be able to tell whether the identifier or the password was
    /// wrong.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, StoreError> {
        ensure_connected(&self.db).await?;

        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(StoreError::validation("username or email is required"));
        }
        if password.is_empty() {
            return Err(StoreError::validation("password is required"));
        }

        let user = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier))
                    .add(user::Column::Email.eq(identifier.to_lowercase())),
            )
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("login_lookup", e))?;

        let user = user.ok_or_else(invalid_credentials)?;

        if !crypto::verify_password(password, &user.password_hash) {
            return Err(invalid_credentials());
        }

        // A user record with an unknown role string falls back to the
        // lowest privilege rather than failing the login.
        let role = user.role.parse().unwrap_or(Role::Sales);
        let token = self.tokens.issue(user.id, &user.username, &user.email, role)?;

        Ok(LoginOutcome { token, role, user })
    }
}

fn invalid_credentials() -> StoreError {
    StoreError::unauthorized("invalid username/email or password")
}
