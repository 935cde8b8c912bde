use canteen_backend::{
    api::{self, AppState},
    config::{database, seed, server::ServerConfig},
    core::{auth, crypto::FieldCipher, store::Store},
    errors::Result,
};
use dotenvy::dotenv;
use std::sync::Arc;
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

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Server settings, including the field-encryption key
    let server_config = ServerConfig::from_env()
        .inspect_err(|e| error!("Critical error loading server configuration: {}", e))?;

    // 4. Database connection and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    let store = Store::new(db);
    let cipher = Arc::new(FieldCipher::new(&server_config.encryption_key));

    // 5. Seed accounts that do not exist yet
    let seed_config = seed::load_default_config()?;
    auth::seed_accounts(&store, &cipher, &seed_config)
        .await
        .inspect(|created| info!("Seeded {} account(s).", created))
        .inspect_err(|e| error!("Failed to seed accounts: {}", e))?;

    // 6. Serve until shutdown
    api::serve(server_config.bind_address, AppState::new(store, cipher)).await
}
