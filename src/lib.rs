pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use error::{DashboardError, DashboardResult};
pub use logic::{DashboardService, Transaction};

// Export all model types
pub use model::*;

// Export store types
pub use store::{InMemoryStore, PostgresStore, Store};

use std::sync::Arc;

/// The HTTP application over a dashboard service backed by `store`
pub fn build_app<S: Store + 'static>(store: Arc<S>) -> axum::Router {
    let service = Arc::new(DashboardService::new(store));
    routes::create_router::<S>().with_state(service)
}

/// Serve the application on an already bound listener
pub async fn run_server<S: Store + 'static>(
    store: Arc<S>,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let address = listener.local_addr()?;
    log::info!("dashboard service listening on http://{}", address);
    axum::serve(listener, build_app(store)).await?;
    Ok(())
}
