use blue_devil::{
    config::{app::AppConfig, database, envinfo},
    errors::Result,
    web::{self, AppState},
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file
    dotenv().ok(); // Make it non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = AppConfig::from_env()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    let env_info = envinfo::load_envinfo(&app_config.envinfo_path)?;

    // 4. Connect and make sure every table exists
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    // 5. Serve until shutdown
    let state = AppState::new(db, app_config, env_info)?;
    web::serve(state).await
}
