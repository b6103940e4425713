use std::sync::Arc;

use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::{AuthService, TokenService};
use crate::types::dto::auth::{LoginRequest, LoginResponse};

/// Authentication API endpoints
pub struct AuthApi {
    auth_service: Arc<AuthService>,
    tokens: Arc<TokenService>,
}

impl AuthApi {
    pub fn new(app_data: &AppData) -> Self {
        Self {
            auth_service: Arc::clone(&app_data.auth_service),
            tokens: Arc::clone(&app_data.tokens),
        }
    }
}

#[derive(Tags)]
enum AuthTags {
    /// Authentication endpoints
    Authentication,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with username or email and password to receive a session token
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, body: Json<LoginRequest>) -> Result<Json<LoginResponse>, ApiError> {
        let outcome = self.auth_service.login(&body.username, &body.password).await?;

        tracing::info!(user_id = outcome.user.id, "login succeeded");
        Ok(Json(LoginResponse {
            token: outcome.token,
            token_type: "Bearer".to_string(),
            expires_in: self.tokens.expiry_seconds(),
            user: outcome.user.into(),
        }))
    }
}
