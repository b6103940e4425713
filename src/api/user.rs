use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi, Tags,
};

use crate::api::{actor, authenticate, BearerAuth};
use crate::app_data::AppData;
use crate::errors::ApiError;
use crate::services::permission_evaluator::Role;
use crate::services::TokenService;
use crate::stores::user_store::{NewUser, UserFilter, UserStore, UserUpdate};
use crate::types::dto::common::DeletedResponse;
use crate::types::dto::user::{
    CreateUserRequest, UpdateUserRequest, UserListResponse, UserResponse,
};

/// User management API endpoints
pub struct UserApi {
    user_store: Arc<UserStore>,
    tokens: Arc<TokenService>,
}

impl UserApi {
    pub fn new(app_data: &AppData) -> Self {
        Self {
            user_store: Arc::clone(&app_data.user_store),
            tokens: Arc::clone(&app_data.tokens),
        }
    }
}

#[derive(Tags)]
enum UserTags {
    /// User management endpoints
    Users,
}

#[OpenApi(prefix_path = "/users")]
impl UserApi {
    /// List users visible to the caller, newest first
    #[oai(path = "/", method = "get", tag = "UserTags::Users")]
    async fn list_users(
        &self,
        auth: BearerAuth,
        page: Query<Option<u64>>,
        pagesize: Query<Option<u64>>,
        search: Query<Option<String>>,
        role: Query<Option<String>>,
    ) -> Result<Json<UserListResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;

        let filter = UserFilter {
            search: search.0,
            // An unknown role filter value is silently ignored rather
            // than rejected.
            role: role.0.as_deref().and_then(|r| r.parse::<Role>().ok()),
        };
        let page = self
            .user_store
            .list(actor(&claims), filter, page.0.unwrap_or(1), pagesize.0.unwrap_or(10))
            .await?;

        Ok(Json(UserListResponse {
            users: page.users.into_iter().map(Into::into).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
        }))
    }

    /// Get a single user by id
    #[oai(path = "/:id", method = "get", tag = "UserTags::Users")]
    async fn get_user(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
    ) -> Result<Json<UserResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        let user = self.user_store.get_by_id(actor(&claims), id.0).await?;
        Ok(Json(user.into()))
    }

    /// Create a user (permission-gated by the caller's role)
    #[oai(path = "/", method = "post", tag = "UserTags::Users")]
    async fn create_user(
        &self,
        auth: BearerAuth,
        body: Json<CreateUserRequest>,
    ) -> Result<Json<UserResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        let body = body.0;

        let user = self
            .user_store
            .create(
                actor(&claims),
                NewUser {
                    username: body.username,
                    email: body.email,
                    password: body.password,
                    role: parse_role(body.role.as_deref())?,
                },
            )
            .await?;
        Ok(Json(user.into()))
    }

    /// Update a user; omitted fields are left unchanged
    #[oai(path = "/:id", method = "put", tag = "UserTags::Users")]
    async fn update_user(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
        body: Json<UpdateUserRequest>,
    ) -> Result<Json<UserResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        let body = body.0;

        let user = self
            .user_store
            .update(
                actor(&claims),
                id.0,
                UserUpdate {
                    username: body.username,
                    email: body.email,
                    password: body.password,
                    role: parse_role(body.role.as_deref())?,
                },
            )
            .await?;
        Ok(Json(user.into()))
    }

    /// Delete a user
    #[oai(path = "/:id", method = "delete", tag = "UserTags::Users")]
    async fn delete_user(
        &self,
        auth: BearerAuth,
        id: Path<i64>,
    ) -> Result<Json<DeletedResponse>, ApiError> {
        let claims = authenticate(&self.tokens, &auth)?;
        self.user_store.delete(actor(&claims), id.0).await?;
        Ok(Json(DeletedResponse {
            message: "user deleted".to_string(),
        }))
    }
}

/// A role supplied in a request body must be one of the known names.
fn parse_role(raw: Option<&str>) -> Result<Option<Role>, ApiError> {
    match raw {
        None => Ok(None),
        Some(r) => r
            .parse::<Role>()
            .map(Some)
            .map_err(|_| ApiError::bad_request("invalid role")),
    }
}
