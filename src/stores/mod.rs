// Stores layer - Data access against the persistence layer
pub mod product_store;
pub mod product_type_store;
pub mod user_store;

pub use product_store::ProductStore;
pub use product_type_store::ProductTypeStore;
pub use user_store::UserStore;

use sea_orm::DatabaseConnection;

use crate::errors::StoreError;

/// Readiness check run at the top of every store operation: if the
/// persistence layer is not reachable, fail fast with ServiceUnavailable
/// instead of letting the query time out.
pub(crate) async fn ensure_connected(db: &DatabaseConnection) -> Result<(), StoreError> {
    db.ping().await.map_err(|_| StoreError::ServiceUnavailable)
}

/// Escape LIKE metacharacters (and the escape character itself) so a
/// user-supplied search term matches literally. Pair with ESCAPE '\'.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
