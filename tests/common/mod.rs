// Common test utilities for integration tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use mayfly_backend::services::TokenService;
use mayfly_backend::AppData;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-32-characters";

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Creates the full application state against an in-memory database
pub async fn setup_app_data() -> Arc<AppData> {
    let db = setup_test_db().await;
    let tokens = Arc::new(TokenService::new(TEST_JWT_SECRET.to_string(), 24));
    Arc::new(AppData::new(db, tokens))
}

/// Seeds the first super_admin and returns its id
pub async fn seed_super_admin(app_data: &AppData) -> i64 {
    app_data
        .user_store
        .seed_super_admin("root", "root@example.com", "rootsecret")
        .await
        .expect("Failed to seed super admin")
        .expect("Super admin should not exist yet")
        .id
}
