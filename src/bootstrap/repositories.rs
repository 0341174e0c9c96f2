use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::modules::metrics::queries::{MetricsRepository, PostgresMetricsRepository};
use crate::modules::orders::infra::persistence::PostgresOrderRepository;
use crate::modules::orders::repository::OrderRepository;
use crate::modules::users::infra::persistence::PostgresUserRepository;
use crate::modules::users::repository::UserRepository;
use crate::shared::infra::repository::PostgresRepositoryManager;
use crate::shared::repository::RepositoryManager;

pub fn init_repo_manager(db: Arc<DatabaseConnection>) -> Arc<dyn RepositoryManager> {
    let mut manager = PostgresRepositoryManager::new(db.clone());

    manager.register::<Arc<dyn UserRepository>>(Arc::new(PostgresUserRepository::new(db.clone())));
    manager
        .register::<Arc<dyn OrderRepository>>(Arc::new(PostgresOrderRepository::new(db.clone())));
    manager.register::<Arc<dyn MetricsRepository>>(Arc::new(PostgresMetricsRepository::new(db)));

    Arc::new(manager)
}
