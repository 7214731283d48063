use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use geocode_client::GeocodeClient;
use spotsaver_api::{build_router, AppState};
use spotsaver_common::Config;
use spotsaver_store::{PgSpotRepository, SpotRepository, SpotStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("spotsaver=info".parse()?)
                .add_directive("geocode_client=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    let repository = PgSpotRepository::new(pool);
    repository.migrate().await?;
    info!("Database migrations applied");

    let repository: Arc<dyn SpotRepository> = Arc::new(repository);
    let mut store = SpotStore::new(repository, config.insert_failure_policy);
    store.load().await;

    let geocoder = Arc::new(GeocodeClient::new(&config.geocode_url)?);
    let state = Arc::new(AppState::new(store, geocoder));
    let app = build_router(state);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("SpotSaver API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("SpotSaver API stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
