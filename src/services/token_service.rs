use std::fmt;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::StoreError;
use crate::services::permission_evaluator::Role;
use crate::types::internal::Claims;

/// Signs and validates session tokens (HS256).
pub struct TokenService {
    jwt_secret: String,
    expiry_hours: i64,
}

impl TokenService {
    pub fn new(jwt_secret: String, expiry_hours: i64) -> Self {
        Self {
            jwt_secret,
            expiry_hours,
        }
    }

    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_hours * 60 * 60
    }

    /// Issue a signed token carrying the user's identity and role.
    pub fn issue(
        &self,
        user_id: i64,
        username: &str,
        email: &str,
        role: Role,
    ) -> Result<String, StoreError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + self.expiry_seconds(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| StoreError::internal(format!("failed to sign token: {e}")))
    }

    /// Validate a token and return its claims.
    ///
    /// Expired and tampered tokens are rejected with the same message, so
    /// callers cannot distinguish the two cases.
    pub fn verify(&self, token: &str) -> Result<Claims, StoreError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| StoreError::unauthorized("invalid or expired token"))
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("jwt_secret", &"<redacted>")
            .field("expiry_hours", &self.expiry_hours)
            .finish()
    }
}
