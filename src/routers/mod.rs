use axum::{Router, routing::get};

use crate::modules::{auth, metrics, orders, users};
use crate::shared::state::AppState;

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/auth", auth::router::router(state.clone()))
        .nest("/users", users::router::router(state.clone()))
        .nest("/orders", orders::router::router(state.clone()))
        .nest("/metrics", metrics::router::router(state))
}
