use axum::{
    Router,
    routing::{get, patch},
};

use super::handlers;
use crate::shared::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_users))
        .route(
            "/:id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/:id/password", patch(handlers::change_password))
        .with_state(state)
}
