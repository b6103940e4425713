use poem_openapi::{payload::Json, ApiResponse, Object};
use std::fmt;

use crate::errors::StoreError;

/// Standardized error body for all endpoints.
#[derive(Object, Debug)]
pub struct ErrorResponse {
    /// Error code identifier
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,

    /// On Conflict: number of dependent records blocking the operation
    pub dependent_count: Option<u64>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            status_code,
            dependent_count: None,
        }
    }
}

/// Typed failure surface shared by every API group.
#[derive(ApiResponse, Debug)]
pub enum ApiError {
    /// Malformed or missing required input
    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    /// Authentication failed or missing
    #[oai(status = 401)]
    Unauthorized(Json<ErrorResponse>),

    /// Authenticated but not permitted
    #[oai(status = 403)]
    Forbidden(Json<ErrorResponse>),

    /// Referenced entity does not exist
    #[oai(status = 404)]
    NotFound(Json<ErrorResponse>),

    /// Blocked by dependent data or a uniqueness violation
    #[oai(status = 409)]
    Conflict(Json<ErrorResponse>),

    /// Unexpected internal failure
    #[oai(status = 500)]
    Internal(Json<ErrorResponse>),

    /// Persistence layer not ready
    #[oai(status = 503)]
    ServiceUnavailable(Json<ErrorResponse>),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(Json(ErrorResponse::new("validation_error", message, 400)))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(Json(ErrorResponse::new("unauthorized", message, 401)))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(Json(ErrorResponse::new("forbidden", message, 403)))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(Json(ErrorResponse::new("not_found", message, 404)))
    }

    pub fn conflict(message: impl Into<String>, dependent_count: Option<u64>) -> Self {
        let mut body = ErrorResponse::new("conflict", message, 409);
        body.dependent_count = dependent_count;
        ApiError::Conflict(Json(body))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(Json(ErrorResponse::new("internal_error", message, 500)))
    }

    pub fn service_unavailable() -> Self {
        ApiError::ServiceUnavailable(Json(ErrorResponse::new(
            "service_unavailable",
            "database not connected",
            503,
        )))
    }

    /// Get the error message from the error variant
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(json)
            | ApiError::Unauthorized(json)
            | ApiError::Forbidden(json)
            | ApiError::NotFound(json)
            | ApiError::Conflict(json)
            | ApiError::Internal(json)
            | ApiError::ServiceUnavailable(json) => &json.0.message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => ApiError::bad_request(message),
            StoreError::NotFound(message) => ApiError::not_found(message),
            StoreError::Conflict {
                message,
                dependent_count,
            } => ApiError::conflict(message, dependent_count),
            StoreError::Unauthorized(message) => ApiError::unauthorized(message),
            StoreError::Forbidden(message) => ApiError::forbidden(message),
            StoreError::ServiceUnavailable => ApiError::service_unavailable(),
            StoreError::Internal(message) => {
                tracing::error!(error = %message, "internal failure");
                ApiError::internal("internal server error")
            }
            StoreError::Database { operation, source } => {
                tracing::error!(operation, error = %source, "persistence layer failure");
                ApiError::internal("internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_409_with_count() {
        let api: ApiError =
            StoreError::conflict_with_count("type has dependent products", 3).into();
        match api {
            ApiError::Conflict(Json(body)) => {
                assert_eq!(body.status_code, 409);
                assert_eq!(body.dependent_count, Some(3));
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn database_errors_never_leak_details() {
        let api: ApiError = StoreError::database(
            "list_products",
            sea_orm::DbErr::Custom("connection refused at 10.0.0.5".into()),
        )
        .into();
        assert_eq!(api.message(), "internal server error");
    }

    #[test]
    fn not_ready_maps_to_503() {
        let api: ApiError = StoreError::ServiceUnavailable.into();
        match api {
            ApiError::ServiceUnavailable(Json(body)) => assert_eq!(body.status_code, 503),
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
    }
}
