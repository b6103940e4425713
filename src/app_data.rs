use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::{AuthService, SequenceAllocator, TokenService};
use crate::stores::{ProductStore, ProductTypeStore, UserStore};

/// Shared application state handed to every API group.
pub struct AppData {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub user_store: Arc<UserStore>,
    pub product_type_store: Arc<ProductTypeStore>,
    pub product_store: Arc<ProductStore>,
}

impl AppData {
    pub fn new(db: DatabaseConnection, tokens: Arc<TokenService>) -> Self {
        let sequences = Arc::new(SequenceAllocator::new(db.clone()));
        Self {
            auth_service: Arc::new(AuthService::new(db.clone(), Arc::clone(&tokens))),
            user_store: Arc::new(UserStore::new(db.clone(), Arc::clone(&sequences))),
            product_type_store: Arc::new(ProductTypeStore::new(db.clone(), Arc::clone(&sequences))),
            product_store: Arc::new(ProductStore::new(db.clone(), sequences)),
            tokens,
            db,
        }
    }
}
