use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::Serialize;
use std::sync::Arc;

use crate::modules::orders::entities::status;
use crate::shared::error::{AppError, AppResult};

// Standard semi-trailer envelope; anything beyond needs special transport.
const MAX_STANDARD_WEIGHT_KG: f64 = 20_000.0;
const MAX_STANDARD_LENGTH_M: f64 = 13.6;
const MAX_STANDARD_WIDTH_M: f64 = 2.45;
const MAX_STANDARD_HEIGHT_M: f64 = 2.7;

const TOP_EXTREMES_PER_DIMENSION: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct BucketCount {
    pub bucket: String,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
pub struct Kpis {
    pub total_orders: i64,
    pub delivered_orders: i64,
    pub in_transit_orders: i64,
    pub registered_users: i64,
    pub average_weight: f64,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult)]
struct RatioRow {
    ratio: f64,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize)]
pub struct ExtremeOrder {
    pub dimension: String,
    pub order_id: i32,
    pub value: f64,
}

/// The composed analytics payload served to admins.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub weight_categories: Vec<BucketCount>,
    pub seasonal_distribution: Vec<BucketCount>,
    pub stuck_orders: Vec<BucketCount>,
    pub kpis: Kpis,
    pub oversized_ratio: f64,
    pub extremes: Vec<ExtremeOrder>,
}

#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn summary(&self) -> AppResult<MetricsSummary>;
}

pub struct PostgresMetricsRepository {
    db: Arc<DatabaseConnection>,
}

impl PostgresMetricsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn buckets(&self, sql: String) -> AppResult<Vec<BucketCount>> {
        BucketCount::find_by_statement(Statement::from_string(DbBackend::Postgres, sql))
            .all(self.db.as_ref())
            .await
            .map_err(AppError::DbError)
    }

    fn weight_categories_sql() -> String {
        "SELECT CASE \
             WHEN weight < 100 THEN 'LIGHT' \
             WHEN weight < 1000 THEN 'MEDIUM' \
             WHEN weight < 10000 THEN 'HEAVY' \
             ELSE 'EXTRA_HEAVY' \
         END AS bucket, COUNT(*) AS count \
         FROM orders GROUP BY bucket ORDER BY MIN(weight)"
            .to_string()
    }

    fn seasonal_distribution_sql() -> String {
        "SELECT CASE \
             WHEN EXTRACT(MONTH FROM create_at) IN (12, 1, 2) THEN 'WINTER' \
             WHEN EXTRACT(MONTH FROM create_at) IN (3, 4, 5) THEN 'SPRING' \
             WHEN EXTRACT(MONTH FROM create_at) IN (6, 7, 8) THEN 'SUMMER' \
             ELSE 'AUTUMN' \
         END AS bucket, COUNT(*) AS count \
         FROM orders GROUP BY bucket ORDER BY bucket"
            .to_string()
    }

    fn stuck_orders_sql() -> String {
        format!(
            "SELECT CASE \
                 WHEN create_at > NOW() - INTERVAL '7 days' THEN 'UNDER_WEEK' \
                 WHEN create_at > NOW() - INTERVAL '30 days' THEN 'UNDER_MONTH' \
                 ELSE 'OVER_MONTH' \
             END AS bucket, COUNT(*) AS count \
             FROM orders WHERE status_id <> {} GROUP BY bucket ORDER BY MIN(create_at)",
            status::DELIVERED
        )
    }

    fn kpis_sql() -> String {
        format!(
            "SELECT COUNT(*) AS total_orders, \
                    COUNT(*) FILTER (WHERE status_id = {delivered}) AS delivered_orders, \
                    COUNT(*) FILTER (WHERE status_id = {transit}) AS in_transit_orders, \
                    (SELECT COUNT(*) FROM users) AS registered_users, \
                    COALESCE(AVG(weight), 0)::float8 AS average_weight \
             FROM orders",
            delivered = status::DELIVERED,
            transit = status::ON_TRANSIT,
        )
    }

    fn oversized_ratio_sql() -> String {
        format!(
            "SELECT COALESCE(AVG(CASE \
                 WHEN weight > {weight} OR length > {length} \
                   OR width > {width} OR height > {height} \
                 THEN 1.0 ELSE 0.0 END), 0)::float8 AS ratio \
             FROM orders",
            weight = MAX_STANDARD_WEIGHT_KG,
            length = MAX_STANDARD_LENGTH_M,
            width = MAX_STANDARD_WIDTH_M,
            height = MAX_STANDARD_HEIGHT_M,
        )
    }

    fn extremes_sql() -> String {
        let top = TOP_EXTREMES_PER_DIMENSION;
        format!(
            "(SELECT 'WEIGHT' AS dimension, id AS order_id, weight AS value \
              FROM orders ORDER BY weight DESC LIMIT {top}) \
             UNION ALL \
             (SELECT 'LENGTH' AS dimension, id AS order_id, length AS value \
              FROM orders ORDER BY length DESC LIMIT {top}) \
             UNION ALL \
             (SELECT 'WIDTH' AS dimension, id AS order_id, width AS value \
              FROM orders ORDER BY width DESC LIMIT {top}) \
             UNION ALL \
             (SELECT 'HEIGHT' AS dimension, id AS order_id, height AS value \
              FROM orders ORDER BY height DESC LIMIT {top})",
        )
    }
}

#[async_trait]
impl MetricsRepository for PostgresMetricsRepository {
    async fn summary(&self) -> AppResult<MetricsSummary> {
        let weight_categories = self.buckets(Self::weight_categories_sql()).await?;
        let seasonal_distribution = self.buckets(Self::seasonal_distribution_sql()).await?;
        let stuck_orders = self.buckets(Self::stuck_orders_sql()).await?;

        let kpis = Kpis::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            Self::kpis_sql(),
        ))
        .one(self.db.as_ref())
        .await
        .map_err(AppError::DbError)?
        .ok_or(AppError::InternalServerError(
            "KPI aggregate returned no row".to_string(),
        ))?;

        let oversized_ratio = RatioRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            Self::oversized_ratio_sql(),
        ))
        .one(self.db.as_ref())
        .await
        .map_err(AppError::DbError)?
        .map(|row| row.ratio)
        .unwrap_or(0.0);

        let extremes = ExtremeOrder::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            Self::extremes_sql(),
        ))
        .all(self.db.as_ref())
        .await
        .map_err(AppError::DbError)?;

        Ok(MetricsSummary {
            weight_categories,
            seasonal_distribution,
            stuck_orders,
            kpis,
            oversized_ratio,
            extremes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap;

    fn bucket_row(bucket: &str, count: i64) -> BTreeMap<&'static str, Value> {
        let mut row = BTreeMap::new();
        row.insert("bucket", Value::from(bucket.to_string()));
        row.insert("count", Value::from(count));
        row
    }

    #[tokio::test]
    async fn summary_composes_all_sections() {
        let mut kpi_row = BTreeMap::new();
        kpi_row.insert("total_orders", Value::from(10i64));
        kpi_row.insert("delivered_orders", Value::from(4i64));
        kpi_row.insert("in_transit_orders", Value::from(2i64));
        kpi_row.insert("registered_users", Value::from(6i64));
        kpi_row.insert("average_weight", Value::from(812.5f64));

        let mut ratio_row = BTreeMap::new();
        ratio_row.insert("ratio", Value::from(0.2f64));

        let mut extreme_row = BTreeMap::new();
        extreme_row.insert("dimension", Value::from("WEIGHT".to_string()));
        extreme_row.insert("order_id", Value::from(3i32));
        extreme_row.insert("value", Value::from(19000.0f64));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    bucket_row("LIGHT", 3),
                    bucket_row("MEDIUM", 5),
                    bucket_row("EXTRA_HEAVY", 2),
                ]])
                .append_query_results([vec![
                    bucket_row("SPRING", 6),
                    bucket_row("WINTER", 4),
                ]])
                .append_query_results([vec![
                    bucket_row("OVER_MONTH", 1),
                    bucket_row("UNDER_WEEK", 5),
                ]])
                .append_query_results([vec![kpi_row]])
                .append_query_results([vec![ratio_row]])
                .append_query_results([vec![extreme_row]])
                .into_connection(),
        );

        let repo = PostgresMetricsRepository::new(db);
        let summary = repo.summary().await.expect("summary ok");

        assert_eq!(summary.weight_categories.len(), 3);
        assert_eq!(summary.weight_categories[0].bucket, "LIGHT");
        assert_eq!(summary.seasonal_distribution[0].count, 6);
        assert_eq!(summary.stuck_orders[0].bucket, "OVER_MONTH");
        assert_eq!(summary.kpis.total_orders, 10);
        assert_eq!(summary.kpis.registered_users, 6);
        assert_eq!(summary.oversized_ratio, 0.2);
        assert_eq!(summary.extremes[0].dimension, "WEIGHT");
        assert_eq!(summary.extremes[0].order_id, 3);
    }

    #[tokio::test]
    async fn summary_with_no_orders_has_empty_sections() {
        let mut kpi_row = BTreeMap::new();
        kpi_row.insert("total_orders", Value::from(0i64));
        kpi_row.insert("delivered_orders", Value::from(0i64));
        kpi_row.insert("in_transit_orders", Value::from(0i64));
        kpi_row.insert("registered_users", Value::from(1i64));
        kpi_row.insert("average_weight", Value::from(0.0f64));

        let mut ratio_row = BTreeMap::new();
        ratio_row.insert("ratio", Value::from(0.0f64));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results::<BTreeMap<&str, Value>, _, _>([vec![]])
                .append_query_results::<BTreeMap<&str, Value>, _, _>([vec![]])
                .append_query_results::<BTreeMap<&str, Value>, _, _>([vec![]])
                .append_query_results([vec![kpi_row]])
                .append_query_results([vec![ratio_row]])
                .append_query_results::<BTreeMap<&str, Value>, _, _>([vec![]])
                .into_connection(),
        );

        let repo = PostgresMetricsRepository::new(db);
        let summary = repo.summary().await.expect("summary ok");

        assert!(summary.weight_categories.is_empty());
        assert!(summary.extremes.is_empty());
        assert_eq!(summary.kpis.total_orders, 0);
        assert_eq!(summary.oversized_ratio, 0.0);
    }
}
