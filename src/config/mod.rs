// Configuration layer - environment-driven startup settings
pub mod bootstrap_settings;
pub mod database;
pub mod logging;

pub use bootstrap_settings::{BootstrapSettings, ConfigError};
pub use database::{init_database, migrate};
pub use logging::init_logging;
