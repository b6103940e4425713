use poem_openapi::Object;

/// Response model for the health check endpoint
#[derive(Object, Debug)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,

    /// Timestamp of the health check (ISO 8601 format)
    pub timestamp: String,

    /// Persistence layer readiness ("connected" or "disconnected")
    pub database: String,
}

/// Generic acknowledgement for delete endpoints
#[derive(Object, Debug)]
pub struct DeletedResponse {
    /// Human-readable confirmation message
    pub message: String,
}
