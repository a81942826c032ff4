//! FuelFlow API Server
//!
//! Main entry point for the FuelFlow backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fuelflow_api::{AppState, create_router};
use fuelflow_core::storage::{BlobStore, BlobStoreConfig, StorageBackend};
use fuelflow_db::connect;
use fuelflow_shared::config::StorageSettings;
use fuelflow_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuelflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
        #[allow(clippy::cast_possible_wrap)]
        refresh_token_expires_days: (config.jwt.refresh_token_expiry_secs / 86400) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Create blob store when storage is configured
    let storage = match &config.storage {
        Some(settings) => {
            let store_config = blob_store_config(settings)?;
            let store = BlobStore::from_config(store_config)
                .context("Failed to initialize blob store")?;
            info!(backend = %store.backend_name(), "Attachment storage configured");
            Some(Arc::new(store))
        }
        None => {
            warn!("No storage configured; attachment endpoints will be unavailable");
            None
        }
    };

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the blob store configuration from the loaded settings.
fn blob_store_config(settings: &StorageSettings) -> anyhow::Result<BlobStoreConfig> {
    let require = |field: &Option<String>, name: &str| -> anyhow::Result<String> {
        field
            .clone()
            .with_context(|| format!("storage.{name} is required for provider {}", settings.provider))
    };

    let backend = match settings.provider.as_str() {
        "s3" => StorageBackend::s3(
            require(&settings.endpoint, "endpoint")?,
            require(&settings.bucket, "bucket")?,
            require(&settings.access_key_id, "access_key_id")?,
            require(&settings.secret_access_key, "secret_access_key")?,
            settings.region.clone().unwrap_or_else(|| "auto".to_string()),
        ),
        "azure_blob" => StorageBackend::azure_blob(
            require(&settings.account, "account")?,
            require(&settings.access_key, "access_key")?,
            require(&settings.bucket, "bucket")?,
        ),
        "local" => StorageBackend::local_fs(require(&settings.root, "root")?),
        other => anyhow::bail!("unknown storage provider: {other}"),
    };

    let mut config = BlobStoreConfig::new(backend);
    if let Some(max) = settings.max_file_size {
        config = config.with_max_file_size(max);
    }
    Ok(config)
}
