use axum::{Router, middleware, routing::get};

use super::handlers;
use crate::shared::middleware::require_admin;
use crate::shared::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .with_state(state)
}
