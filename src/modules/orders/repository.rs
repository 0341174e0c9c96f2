use async_trait::async_trait;

use super::entities::{file, order};
use crate::shared::error::AppResult;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<order::Model>>;
    async fn list_all(&self) -> AppResult<Vec<order::Model>>;
    async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<order::Model>>;

    async fn create(&self, order: order::ActiveModel) -> AppResult<order::Model>;
    async fn update(&self, order: order::ActiveModel) -> AppResult<order::Model>;
    async fn delete(&self, id: i32) -> AppResult<bool>;

    async fn add_file(&self, file: file::ActiveModel) -> AppResult<file::Model>;
    async fn find_file(&self, file_id: i32) -> AppResult<Option<file::Model>>;
    async fn list_files(&self, order_id: i32) -> AppResult<Vec<file::FileMeta>>;
    async fn delete_file(&self, file_id: i32) -> AppResult<bool>;

    fn with_transaction(
        &self,
        uow: &dyn crate::shared::repository::UnitOfWork,
    ) -> Option<Box<dyn OrderRepository>>;
}
