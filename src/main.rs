use std::env;
use std::sync::Arc;

use poem::{listener::TcpListener, Route, Server};
use poem_openapi::OpenApiService;

use mayfly_backend::api::{AuthApi, HealthApi, ProductApi, ProductTypeApi, UserApi};
use mayfly_backend::config::{self, BootstrapSettings};
use mayfly_backend::services::TokenService;
use mayfly_backend::AppData;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    config::init_logging()?;

    let settings = BootstrapSettings::from_env()?;

    let db = config::init_database(&settings).await?;
    config::migrate(&db).await?;

    let tokens = Arc::new(TokenService::new(
        settings.jwt_secret.clone(),
        settings.jwt_expiry_hours,
    ));
    let app_data = Arc::new(AppData::new(db, tokens));

    seed_super_admin(&app_data).await;

    let api_service = OpenApiService::new(
        (
            HealthApi::new(&app_data),
            AuthApi::new(&app_data),
            UserApi::new(&app_data),
            ProductTypeApi::new(&app_data),
            ProductApi::new(&app_data),
        ),
        "Catalog Backend",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("http://{}/api", settings.bind_address()));

    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/swagger", ui);

    tracing::info!(address = %settings.bind_address(), "starting server");
    Server::new(TcpListener::bind(settings.bind_address()))
        .run(app)
        .await?;

    Ok(())
}

/// Provision the first super_admin account from the environment. The API
/// cannot create one, so a fresh deployment sets SUPER_ADMIN_USERNAME,
/// SUPER_ADMIN_EMAIL and SUPER_ADMIN_PASSWORD once; an existing account
/// makes this a no-op.
async fn seed_super_admin(app_data: &AppData) {
    let (username, email, password) = match (
        env::var("SUPER_ADMIN_USERNAME"),
        env::var("SUPER_ADMIN_EMAIL"),
        env::var("SUPER_ADMIN_PASSWORD"),
    ) {
        (Ok(u), Ok(e), Ok(p)) => (u, e, p),
        _ => return,
    };

    match app_data
        .user_store
        .seed_super_admin(&username, &email, &password)
        .await
    {
        Ok(Some(user)) => tracing::info!(user_id = user.id, "super admin account created"),
        Ok(None) => tracing::info!("super admin account already present"),
        Err(err) => tracing::error!(error = %err, "failed to seed super admin account"),
    }
}
