mod api;
mod middleware;

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use venuegeo_db::PgRecordStore;
use venuegeo_geocoder::{GeocoderSettings, MapboxGeocoder};
use venuegeo_reconcile::{ReconcileConfig, ReconciliationEngine};

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = venuegeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = venuegeo_db::PoolConfig::from_app_config(&config);
    let pool = venuegeo_db::connect_pool(&config.database_url, pool_config).await?;
    venuegeo_db::run_migrations(&pool).await?;

    let geocoder = MapboxGeocoder::new(&GeocoderSettings::from_app_config(&config))?;
    let engine = ReconciliationEngine::new(geocoder, PgRecordStore::new(pool));
    let state = AppState::new(
        engine,
        ReconcileConfig::from_app_config(&config),
        Duration::from_secs(config.run_timeout_secs),
    );
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "venuegeo server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
