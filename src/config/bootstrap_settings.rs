use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVariable(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Infrastructure settings loaded once at startup.
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

impl BootstrapSettings {
    /// Load settings from environment variables.
    ///
    /// `JWT_SECRET` is the only variable without a default; refusing to
    /// start beats signing tokens with a known secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://catalog.db?mode=rwc".to_string());
        let server_host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("PORT", 3000)?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVariable("JWT_SECRET"))?;
        // Default of one week, matching the legacy deployment.
        let jwt_expiry_hours = parse_var("JWT_EXPIRY_HOURS", 168)?;

        Ok(Self {
            database_url,
            server_host,
            server_port,
            jwt_secret,
            jwt_expiry_hours,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
