// Database entities - SeaORM models
pub mod product;
pub mod product_type;
pub mod user;
