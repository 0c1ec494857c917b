// src/main.rs

use logepi::infra::{config::Settings, database};
use logepi::transport;
use logepi::PgEventStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Configuration ---
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Failed loading configuration");
            return Err(e.into());
        }
    };

    // --- Connection Provider ---
    let pool = match database::connect(&settings.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed connection to DB");
            return Err(e.into());
        }
    };
    let store = Arc::new(PgEventStore::new(pool.clone()));
    let app_state = transport::http::AppState::from_settings(store, &settings);

    // --- API Server ---
    let app = transport::http::build_app(app_state);
    let listen_on = settings.listen_on();
    let listener = tokio::net::TcpListener::bind(&listen_on).await?;
    tracing::info!("Started Logepi on {}", listen_on);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received (Ctrl+C)");
    })
    .await?;

    pool.close().await;
    tracing::info!("Graceful shutdown complete.");
    Ok(())
}
