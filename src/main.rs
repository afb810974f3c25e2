use std::net::SocketAddr;
use std::sync::Arc;

use mimalloc::MiMalloc;
use studiopulse::config::AppConfig;
use studiopulse::services::dashboard::DashboardAggregator;
use studiopulse::store::postgres::PgRecordStore;
use studiopulse::store::RecordStore;
use studiopulse::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studiopulse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let pool = studiopulse::db::create_pool(&config.database_url, config.database_max_connections)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::connect(pool));
    let aggregator = Arc::new(DashboardAggregator::new(Arc::clone(&store)));
    Arc::clone(&aggregator).start().await;

    let state = AppState {
        store,
        aggregator: Arc::clone(&aggregator),
        config: config.clone(),
    };
    let app = studiopulse::routes::api_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(host = %addr, "Starting studiopulse API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    aggregator.stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install shutdown signal handler");
    }
}
