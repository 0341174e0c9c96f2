use chrono::{NaiveDate, Utc};
use sea_orm::Set;
use std::collections::HashMap;
use std::sync::Arc;

use crate::modules::orders::entities::{file, order, status};
use crate::modules::orders::repository::OrderRepository;
use crate::shared::error::{AppError, AppResult};
use crate::shared::repository::RepositoryManager;

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub info: String,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub origin: String,
    pub destination: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

pub struct OrderService;

impl OrderService {
    /// Builds a NewOrder from multipart text fields. Field names follow the
    /// wire format: from/to for origin/destination, dates as YYYY-MM-DD.
    pub fn build_new_order(fields: &HashMap<String, String>) -> AppResult<NewOrder> {
        let order = NewOrder {
            info: required(fields, "info")?.to_string(),
            weight: parse_f64(fields, "weight")?,
            length: parse_f64(fields, "length")?,
            width: parse_f64(fields, "width")?,
            height: parse_f64(fields, "height")?,
            origin: required(fields, "from")?.to_string(),
            destination: required(fields, "to")?.to_string(),
            date_start: parse_date(fields, "date_start")?,
            date_end: parse_date(fields, "date_end")?,
        };

        Self::validate(&order)?;
        Ok(order)
    }

    pub fn validate(order: &NewOrder) -> AppResult<()> {
        if order.info.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Cargo description is required".to_string(),
            ));
        }
        if order.weight <= 0.0 {
            return Err(AppError::BadRequest("Weight must be positive".to_string()));
        }
        if order.length <= 0.0 || order.width <= 0.0 || order.height <= 0.0 {
            return Err(AppError::BadRequest(
                "Dimensions must be positive".to_string(),
            ));
        }
        if order.origin.trim().is_empty() || order.destination.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Origin and destination are required".to_string(),
            ));
        }
        if order.date_end < order.date_start {
            return Err(AppError::BadRequest(
                "End date must not precede start date".to_string(),
            ));
        }
        Ok(())
    }

    /// Inserts the order row and all attachment rows in one transaction, so a
    /// failure mid-way never leaves a half-created order behind.
    pub async fn create_with_files(
        repo_manager: &dyn RepositoryManager,
        new_order: NewOrder,
        files: Vec<NewFile>,
        user_id: i32,
    ) -> AppResult<order::Model> {
        Self::validate(&new_order)?;

        let order_repo = repo_manager
            .get::<Arc<dyn OrderRepository>>()
            .cloned()
            .ok_or(AppError::InternalServerError(
                "OrderRepository not registered".to_string(),
            ))?;

        let active = order::ActiveModel {
            info: Set(new_order.info),
            weight: Set(new_order.weight),
            length: Set(new_order.length),
            width: Set(new_order.width),
            height: Set(new_order.height),
            origin: Set(new_order.origin),
            destination: Set(new_order.destination),
            create_at: Set(Utc::now().naive_utc()),
            date_start: Set(new_order.date_start),
            date_end: Set(new_order.date_end),
            status_id: Set(status::NOT_ACCEPTED),
            user_id: Set(user_id),
            ..Default::default()
        };

        let uow = repo_manager.begin().await?;
        let tx_repo = order_repo
            .with_transaction(uow.as_ref())
            .ok_or(AppError::InternalServerError(
                "OrderRepository does not support transactions".to_string(),
            ))?;

        let result: AppResult<order::Model> = async {
            let created = tx_repo.create(active).await?;
            for new_file in files {
                tx_repo
                    .add_file(file::ActiveModel {
                        order_id: Set(created.id),
                        name: Set(new_file.name),
                        mime_type: Set(new_file.mime_type),
                        content: Set(new_file.content),
                        ..Default::default()
                    })
                    .await?;
            }
            Ok(created)
        }
        .await;

        match result {
            Ok(created) => {
                uow.commit().await?;
                tracing::info!("Created order {} with attachments", created.id);
                Ok(created)
            }
            Err(e) => {
                uow.rollback().await?;
                Err(e)
            }
        }
    }
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> AppResult<&'a str> {
    fields
        .get(key)
        .map(|s| s.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or(AppError::BadRequest(format!("Missing field: {}", key)))
}

fn parse_f64(fields: &HashMap<String, String>, key: &str) -> AppResult<f64> {
    required(fields, key)?
        .parse::<f64>()
        .map_err(|_| AppError::BadRequest(format!("Field {} must be a number", key)))
}

fn parse_date(fields: &HashMap<String, String>, key: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(required(fields, key)?, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Field {} must be a YYYY-MM-DD date", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::repositories::init_repo_manager;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_fields() -> HashMap<String, String> {
        fields(&[
            ("info", "Fragile lab equipment"),
            ("weight", "350.5"),
            ("length", "1.8"),
            ("width", "1.1"),
            ("height", "1.4"),
            ("from", "Rotterdam"),
            ("to", "Berlin"),
            ("date_start", "2024-04-01"),
            ("date_end", "2024-04-05"),
        ])
    }

    #[test]
    fn builds_order_from_valid_fields() {
        let order = OrderService::build_new_order(&valid_fields()).expect("valid payload");
        assert_eq!(order.origin, "Rotterdam");
        assert_eq!(order.destination, "Berlin");
        assert_eq!(order.weight, 350.5);
    }

    #[test]
    fn rejects_missing_field() {
        let mut payload = valid_fields();
        payload.remove("weight");
        let err = OrderService::build_new_order(&payload).expect_err("missing weight");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn rejects_non_numeric_weight() {
        let mut payload = valid_fields();
        payload.insert("weight".to_string(), "heavy".to_string());
        assert!(OrderService::build_new_order(&payload).is_err());
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let mut payload = valid_fields();
        payload.insert("height".to_string(), "0".to_string());
        assert!(OrderService::build_new_order(&payload).is_err());
    }

    #[test]
    fn rejects_inverted_date_range() {
        let mut payload = valid_fields();
        payload.insert("date_end".to_string(), "2024-03-01".to_string());
        assert!(OrderService::build_new_order(&payload).is_err());
    }

    #[tokio::test]
    async fn create_with_files_runs_in_one_transaction() {
        let order_row = order::Model {
            id: 11,
            info: "Fragile lab equipment".to_string(),
            weight: 350.5,
            length: 1.8,
            width: 1.1,
            height: 1.4,
            origin: "Rotterdam".to_string(),
            destination: "Berlin".to_string(),
            create_at: Utc::now().naive_utc(),
            date_start: NaiveDate::from_ymd_opt(2024, 4, 1).expect("valid date"),
            date_end: NaiveDate::from_ymd_opt(2024, 4, 5).expect("valid date"),
            status_id: status::NOT_ACCEPTED,
            user_id: 3,
        };
        let file_row = file::Model {
            id: 21,
            order_id: 11,
            name: "manifest.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content: vec![1, 2, 3],
        };

        let db = std::sync::Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![order_row.clone()]])
                .append_query_results([vec![file_row]])
                .into_connection(),
        );
        let manager = init_repo_manager(db.clone());

        let new_order = OrderService::build_new_order(&valid_fields()).expect("valid payload");
        let files = vec![NewFile {
            name: "manifest.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content: vec![1, 2, 3],
        }];

        let created = OrderService::create_with_files(manager.as_ref(), new_order, files, 3)
            .await
            .expect("order created");
        assert_eq!(created.id, 11);

        drop(manager);
        let log = std::sync::Arc::try_unwrap(db)
            .ok()
            .expect("sole ref")
            .into_transaction_log();
        // Both inserts live inside a single transaction entry.
        assert_eq!(log.len(), 1);
        let dump = format!("{:?}", log[0]);
        assert!(dump.contains("orders"));
        assert!(dump.contains("order_files"));
    }
}
