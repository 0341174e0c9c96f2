pub mod database;
pub mod repositories;

use crate::shared::{config::Config, state::AppState};
use std::sync::Arc;

pub async fn create_app_state(config: &Config) -> AppState {
    let db = Arc::new(database::connect_postgres(config).await);
    let repo_manager = repositories::init_repo_manager(db);

    AppState {
        config: Arc::new(config.clone()),
        repo_manager,
    }
}
