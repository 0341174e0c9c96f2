use axum::{Json, extract::State};
use std::sync::Arc;

use super::queries::{MetricsRepository, MetricsSummary};
use crate::shared::{
    error::{AppError, AppResult},
    state::AppState,
};

pub async fn summary(State(state): State<AppState>) -> AppResult<Json<MetricsSummary>> {
    let repo = state
        .repo_manager
        .get::<Arc<dyn MetricsRepository>>()
        .ok_or(AppError::InternalServerError(
            "MetricsRepository not registered".to_string(),
        ))?;

    Ok(Json(repo.summary().await?))
}
