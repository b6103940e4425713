// DTO layer - API-facing request and response shapes
pub mod auth;
pub mod common;
pub mod product;
pub mod product_type;
pub mod user;
