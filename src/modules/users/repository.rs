use async_trait::async_trait;

use super::entities::user;
use crate::shared::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>>;
    async fn list_all(&self) -> AppResult<Vec<user::Model>>;

    async fn create(&self, user: user::ActiveModel) -> AppResult<user::Model>;
    async fn update(&self, user: user::ActiveModel) -> AppResult<user::Model>;
    async fn delete(&self, id: i32) -> AppResult<bool>;

    fn with_transaction(
        &self,
        uow: &dyn crate::shared::repository::UnitOfWork,
    ) -> Option<Box<dyn UserRepository>>;
}
