// API layer - HTTP endpoints
pub mod auth;
pub mod health;
pub mod product;
pub mod product_type;
pub mod user;

pub use auth::AuthApi;
pub use health::HealthApi;
pub use product::ProductApi;
pub use product_type::ProductTypeApi;
pub use user::UserApi;

use poem_openapi::auth::Bearer;
use poem_openapi::SecurityScheme;

use crate::errors::ApiError;
use crate::services::permission_evaluator::{Actor, Role};
use crate::services::TokenService;
use crate::types::internal::Claims;

/// JWT Bearer token authentication
#[derive(SecurityScheme)]
#[oai(
    ty = "bearer",
    key_name = "Authorization",
    key_in = "header",
    bearer_format = "JWT"
)]
pub struct BearerAuth(pub Bearer);

/// Validate the bearer token and return its claims.
pub(crate) fn authenticate(tokens: &TokenService, auth: &BearerAuth) -> Result<Claims, ApiError> {
    Ok(tokens.verify(&auth.0.token)?)
}

pub(crate) fn actor(claims: &Claims) -> Actor {
    Actor {
        user_id: claims.user_id,
        role: claims.role,
    }
}

/// Catalog type management is open to admin and super_admin only.
pub(crate) fn require_catalog_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role >= Role::Admin {
        Ok(())
    } else {
        Err(ApiError::forbidden("insufficient privileges"))
    }
}
