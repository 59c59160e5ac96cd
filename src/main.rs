use dashboard_versioning::config::{AppConfig, StoreBackend};
use dashboard_versioning::store::{InMemoryStore, PostgresStore};
use dashboard_versioning::run_server;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    let config = AppConfig::load()?;
    log::info!(
        "configuration loaded: server={}, store={:?}",
        config.server_address(),
        config.store.backend
    );

    let listener = TcpListener::bind(config.server_address()).await?;

    match config.store.backend {
        StoreBackend::Memory => {
            log::warn!("using the in-memory store; data is lost on shutdown");
            run_server(Arc::new(InMemoryStore::new()), listener).await
        }
        StoreBackend::Postgres => {
            log::info!("connecting to PostgreSQL");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;

            log::info!("running database migrations");
            store.migrate().await?;

            run_server(Arc::new(store), listener).await
        }
    }
}
