use sea_orm::*;

use crate::impl_sea_orm_repo;
use crate::modules::users::entities::user;
use crate::modules::users::repository::UserRepository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::infra::repository::{DbOrTxn, SeaOrmRepository};

pub type PostgresUserRepository = SeaOrmRepository<user::Entity>;

impl_sea_orm_repo!(PostgresUserRepository, UserRepository, {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        match &self.conn {
            DbOrTxn::Conn(c) => user::Entity::find_by_id(id)
                .one(c.as_ref())
                .await
                .map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                user::Entity::find_by_id(id)
                    .one(txn)
                    .await
                    .map_err(AppError::DbError)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        let query = user::Entity::find().filter(user::Column::Email.eq(email));
        match &self.conn {
            DbOrTxn::Conn(c) => query.one(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                query.one(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn list_all(&self) -> AppResult<Vec<user::Model>> {
        let query = user::Entity::find().order_by_asc(user::Column::Id);
        match &self.conn {
            DbOrTxn::Conn(c) => query.all(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                query.all(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn create(&self, user: user::ActiveModel) -> AppResult<user::Model> {
        match &self.conn {
            DbOrTxn::Conn(c) => user.insert(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                user.insert(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn update(&self, user: user::ActiveModel) -> AppResult<user::Model> {
        match &self.conn {
            DbOrTxn::Conn(c) => user.update(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                user.update(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = match &self.conn {
            DbOrTxn::Conn(c) => user::Entity::delete_by_id(id)
                .exec(c.as_ref())
                .await
                .map_err(AppError::DbError)?,
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                user::Entity::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(AppError::DbError)?
            }
        };
        Ok(result.rows_affected > 0)
    }
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::entities::role;
    use std::sync::Arc;

    fn sample_user() -> user::Model {
        user::Model {
            id: 7,
            email: "driver@example.com".to_string(),
            phone: "+4915112345678".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role_id: role::USER,
            created_at: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(12, 0, 0))
                .expect("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn find_by_email_returns_match() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![sample_user()]])
                .into_connection(),
        );
        let repo = PostgresUserRepository::new(db);

        let found = repo
            .find_by_email("driver@example.com")
            .await
            .expect("query ok")
            .expect("user present");
        assert_eq!(found.id, 7);
        assert_eq!(found.role_id, role::USER);
    }

    #[tokio::test]
    async fn delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let repo = PostgresUserRepository::new(db);

        let deleted = repo.delete(99).await.expect("query ok");
        assert!(!deleted);
    }
}
