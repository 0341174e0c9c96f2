use crate::shared::config::Config;
use crate::shared::repository::RepositoryManager;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo_manager: Arc<dyn RepositoryManager>,
}
