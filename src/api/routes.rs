use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dashboards
        .route(
            "/dashboards",
            get(handlers::list_dashboards::<S>).post(handlers::create_dashboard::<S>),
        )
        .route("/dashboards/search", post(handlers::search_dashboards::<S>))
        .route("/dashboards/stat", post(handlers::stat_dashboards::<S>))
        .route(
            "/dashboards/:dashboard_id",
            get(handlers::get_dashboard::<S>)
                .patch(handlers::update_dashboard::<S>)
                .delete(handlers::delete_dashboard::<S>),
        )
        // Versions
        .route(
            "/dashboards/:dashboard_id/versions",
            get(handlers::list_versions::<S>),
        )
        .route(
            "/dashboards/:dashboard_id/versions/:version",
            get(handlers::get_version::<S>).delete(handlers::delete_version::<S>),
        )
        .route(
            "/dashboards/:dashboard_id/versions/:version/revert",
            post(handlers::revert_version::<S>),
        )
}
