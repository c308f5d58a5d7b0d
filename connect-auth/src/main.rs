use anyhow::Result;
use chrono::Duration;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use connect_auth::server::{
    config::{Configuration, StorageBackend},
    router, AppState,
};
use connect_auth::{
    ConnectionStatusService, HttpConnectionProbe, HttpTokenRefresher, MemoryTokenStore,
    SqliteTokenStore, TokenStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    // Load configuration
    let configuration = Configuration::new()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize services
    let store: Arc<dyn TokenStore> = match configuration.storage.backend {
        StorageBackend::Sqlite => {
            Arc::new(SqliteTokenStore::connect(&configuration.storage.database_url).await?)
        }
        StorageBackend::Memory => Arc::new(MemoryTokenStore::new()),
    };

    let provider = &configuration.provider;
    let refresher = Arc::new(HttpTokenRefresher::new(std::time::Duration::from_secs(
        provider.refresh_timeout_seconds,
    ))?);
    let probe = Arc::new(HttpConnectionProbe::new(
        provider.probe_url.clone(),
        std::time::Duration::from_secs(provider.probe_timeout_seconds),
    )?);

    let status_service =
        ConnectionStatusService::new(provider.credentials(), store, refresher, probe)
            .with_refresh_leeway(Duration::seconds(provider.refresh_leeway_seconds));
    tracing::info!(provider = %provider.name, "Connection status service ready");

    let app = router(AppState {
        status_service: Arc::new(status_service),
    });

    // Start server
    let addr = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
