use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection, DbErr};

use crate::config::BootstrapSettings;

/// Connect to the database named by the bootstrap settings.
///
/// Does NOT run migrations; call [`migrate`] separately.
pub async fn init_database(settings: &BootstrapSettings) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(&settings.database_url).await?;
    tracing::debug!(database_url = %settings.database_url, "connected to database");
    Ok(db)
}

/// Bring the schema up to date.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await?;
    tracing::info!("database migrations completed");
    Ok(())
}
