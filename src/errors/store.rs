use sea_orm::DbErr;

/// Error taxonomy for all store and service operations.
///
/// The HTTP layer maps each variant to a status code in `errors::api`;
/// nothing here knows about HTTP. `Database` carries unexpected
/// persistence-layer failures tagged with the operation that hit them;
/// they are surfaced, never retried here.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        /// Number of dependent records blocking the operation, when known.
        dependent_count: Option<u64>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("database not connected")]
    ServiceUnavailable,

    #[error("{0}")]
    Internal(String),

    #[error("database error during {operation}")]
    Database {
        operation: &'static str,
        #[source]
        source: DbErr,
    },
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        StoreError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict {
            message: message.into(),
            dependent_count: None,
        }
    }

    pub fn conflict_with_count(message: impl Into<String>, dependent_count: u64) -> Self {
        StoreError::Conflict {
            message: message.into(),
            dependent_count: Some(dependent_count),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        StoreError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        StoreError::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal(message.into())
    }

    pub fn database(operation: &'static str, source: DbErr) -> Self {
        StoreError::Database { operation, source }
    }
}
