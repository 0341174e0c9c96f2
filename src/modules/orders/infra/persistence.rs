use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::impl_sea_orm_repo;
use crate::modules::orders::entities::{file, order};
use crate::modules::orders::repository::OrderRepository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::infra::repository::{DbOrTxn, SeaOrmRepository};

pub type PostgresOrderRepository = SeaOrmRepository<order::Entity>;

fn files_meta_query(order_id: i32) -> Select<file::Entity> {
    file::Entity::find()
        .select_only()
        .columns([
            file::Column::Id,
            file::Column::OrderId,
            file::Column::Name,
            file::Column::MimeType,
        ])
        .column_as(Expr::cust("OCTET_LENGTH(content)"), "size")
        .filter(file::Column::OrderId.eq(order_id))
        .order_by_asc(file::Column::Id)
}

impl_sea_orm_repo!(PostgresOrderRepository, OrderRepository, {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<order::Model>> {
        match &self.conn {
            DbOrTxn::Conn(c) => order::Entity::find_by_id(id)
                .one(c.as_ref())
                .await
                .map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                order::Entity::find_by_id(id)
                    .one(txn)
                    .await
                    .map_err(AppError::DbError)
            }
        }
    }

    async fn list_all(&self) -> AppResult<Vec<order::Model>> {
        let query = order::Entity::find().order_by_desc(order::Column::CreateAt);
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

    async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<order::Model>> {
        let query = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreateAt);
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

    async fn create(&self, order: order::ActiveModel) -> AppResult<order::Model> {
        match &self.conn {
            DbOrTxn::Conn(c) => order.insert(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                order.insert(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn update(&self, order: order::ActiveModel) -> AppResult<order::Model> {
        match &self.conn {
            DbOrTxn::Conn(c) => order.update(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                order.update(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = match &self.conn {
            DbOrTxn::Conn(c) => order::Entity::delete_by_id(id)
                .exec(c.as_ref())
                .await
                .map_err(AppError::DbError)?,
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                order::Entity::delete_by_id(id)
                    .exec(txn)
                    .await
                    .map_err(AppError::DbError)?
            }
        };
        Ok(result.rows_affected > 0)
    }

    async fn add_file(&self, file: file::ActiveModel) -> AppResult<file::Model> {
        match &self.conn {
            DbOrTxn::Conn(c) => file.insert(c.as_ref()).await.map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                file.insert(txn).await.map_err(AppError::DbError)
            }
        }
    }

    async fn find_file(&self, file_id: i32) -> AppResult<Option<file::Model>> {
        match &self.conn {
            DbOrTxn::Conn(c) => file::Entity::find_by_id(file_id)
                .one(c.as_ref())
                .await
                .map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                file::Entity::find_by_id(file_id)
                    .one(txn)
                    .await
                    .map_err(AppError::DbError)
            }
        }
    }

    async fn list_files(&self, order_id: i32) -> AppResult<Vec<file::FileMeta>> {
        let query = files_meta_query(order_id);
        match &self.conn {
            DbOrTxn::Conn(c) => query
                .into_model::<file::FileMeta>()
                .all(c.as_ref())
                .await
                .map_err(AppError::DbError),
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                query
                    .into_model::<file::FileMeta>()
                    .all(txn)
                    .await
                    .map_err(AppError::DbError)
            }
        }
    }

    async fn delete_file(&self, file_id: i32) -> AppResult<bool> {
        let result = match &self.conn {
            DbOrTxn::Conn(c) => file::Entity::delete_by_id(file_id)
                .exec(c.as_ref())
                .await
                .map_err(AppError::DbError)?,
            DbOrTxn::Txn(mutex) => {
                let lock = mutex.lock().await;
                let txn = lock.as_ref().ok_or(AppError::InternalServerError(
                    "Transaction already completed".to_string(),
                ))?;
                file::Entity::delete_by_id(file_id)
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
    use crate::modules::orders::entities::status;
    use std::sync::Arc;

    fn sample_order(id: i32, user_id: i32) -> order::Model {
        order::Model {
            id,
            info: "Pallets of machine parts".to_string(),
            weight: 1200.0,
            length: 2.4,
            width: 1.2,
            height: 1.0,
            origin: "Hamburg".to_string(),
            destination: "Munich".to_string(),
            create_at: chrono::NaiveDate::from_ymd_opt(2024, 3, 4)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .expect("valid timestamp"),
            date_start: chrono::NaiveDate::from_ymd_opt(2024, 3, 10).expect("valid date"),
            date_end: chrono::NaiveDate::from_ymd_opt(2024, 3, 14).expect("valid date"),
            status_id: status::NOT_ACCEPTED,
            user_id,
        }
    }

    #[tokio::test]
    async fn list_by_user_filters_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![sample_order(1, 5), sample_order(2, 5)]])
                .into_connection(),
        );
        let repo = PostgresOrderRepository::new(db.clone());

        let orders = repo.list_by_user(5).await.expect("query ok");
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.user_id == 5));

        drop(repo);
        let log = Arc::try_unwrap(db).ok().expect("sole ref").into_transaction_log();
        assert!(format!("{:?}", log[0]).contains("user_id"));
    }

    #[tokio::test]
    async fn delete_file_reports_result() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let repo = PostgresOrderRepository::new(db);

        assert!(repo.delete_file(3).await.expect("query ok"));
    }
}
