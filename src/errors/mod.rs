// Errors layer - Error type definitions
pub mod api;
pub mod store;

// Re-exports for convenience
pub use api::{ApiError, ErrorResponse};
pub use store::StoreError;
