use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch},
};

use super::handlers;
use crate::shared::state::AppState;

// Attachment uploads can carry several photos per order.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:id",
            get(handlers::get_order)
                .patch(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:id/status", patch(handlers::set_status))
        .route(
            "/:id/files",
            get(handlers::list_files).post(handlers::upload_files),
        )
        .route(
            "/:id/files/:file_id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/:id/files/:file_id/download", get(handlers::download_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
