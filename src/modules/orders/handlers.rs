use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::service::{NewFile, NewOrder, OrderService};
use crate::modules::auth::service::Claims;
use crate::modules::orders::entities::{file, order, status};
use crate::modules::orders::repository::OrderRepository;
use crate::shared::{
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub info: String,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub create_at: chrono::NaiveDateTime,
    pub date_start: chrono::NaiveDate,
    pub date_end: chrono::NaiveDate,
    pub status_id: i32,
    pub status: String,
    pub user_id: i32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub files: Vec<file::FileMeta>,
}

impl OrderResponse {
    fn from_model(order: order::Model, files: Vec<file::FileMeta>) -> Self {
        let status = status::name(order.status_id).unwrap_or("UNKNOWN").to_string();
        Self {
            id: order.id,
            info: order.info,
            weight: order.weight,
            length: order.length,
            width: order.width,
            height: order.height,
            origin: order.origin,
            destination: order.destination,
            create_at: order.create_at,
            date_start: order.date_start,
            date_end: order.date_end,
            status_id: order.status_id,
            status,
            user_id: order.user_id,
            files,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub info: Option<String>,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(rename = "from")]
    pub origin: Option<String>,
    #[serde(rename = "to")]
    pub destination: Option<String>,
    pub date_start: Option<chrono::NaiveDate>,
    pub date_end: Option<chrono::NaiveDate>,
}

#[derive(Deserialize)]
pub struct SetStatusRequest {
    pub status_id: i32,
}

#[derive(Serialize)]
pub struct FileContentResponse {
    pub id: i32,
    pub order_id: i32,
    pub name: String,
    pub mime_type: String,
    pub content: String, // base64
}

fn order_repo(state: &AppState) -> AppResult<Arc<dyn OrderRepository>> {
    state
        .repo_manager
        .get::<Arc<dyn OrderRepository>>()
        .cloned()
        .ok_or(AppError::InternalServerError(
            "OrderRepository not registered".to_string(),
        ))
}

/// Loads an order and applies the admin-or-owner rule.
async fn load_authorized(
    repo: &dyn OrderRepository,
    claims: &Claims,
    order_id: i32,
) -> AppResult<order::Model> {
    let order = repo
        .find_by_id(order_id)
        .await?
        .ok_or(AppError::NotFound)?;
    claims.authorize_owner(order.user_id)?;
    Ok(order)
}

async fn collect_multipart(
    multipart: &mut Multipart,
) -> AppResult<(HashMap<String, String>, Vec<NewFile>)> {
    let mut fields = HashMap::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
                .ok_or(AppError::BadRequest("File part needs a name".to_string()))?;
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let content = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?
                .to_vec();
            files.push(NewFile {
                name: file_name,
                mime_type,
                content,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid field {}: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, files))
}

pub async fn list_orders(
    State(state): State<AppState>,
    claims: Claims,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let repo = order_repo(&state)?;

    let orders = if claims.is_admin() {
        repo.list_all().await?
    } else {
        repo.list_by_user(claims.sub).await?
    };

    Ok(Json(
        orders
            .into_iter()
            .map(|o| OrderResponse::from_model(o, Vec::new()))
            .collect(),
    ))
}

pub async fn create_order(
    State(state): State<AppState>,
    claims: Claims,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<OrderResponse>)> {
    let (fields, files) = collect_multipart(&mut multipart).await?;
    let new_order = OrderService::build_new_order(&fields)?;

    let created = OrderService::create_with_files(
        state.repo_manager.as_ref(),
        new_order,
        files,
        claims.sub,
    )
    .await?;

    let repo = order_repo(&state)?;
    let file_meta = repo.list_files(created.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::from_model(created, file_meta)),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderResponse>> {
    let repo = order_repo(&state)?;
    let order = load_authorized(repo.as_ref(), &claims, id).await?;
    let files = repo.list_files(id).await?;

    Ok(Json(OrderResponse::from_model(order, files)))
}

pub async fn update_order(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let repo = order_repo(&state)?;
    let existing = load_authorized(repo.as_ref(), &claims, id).await?;

    let nothing_to_update = payload.info.is_none()
        && payload.weight.is_none()
        && payload.length.is_none()
        && payload.width.is_none()
        && payload.height.is_none()
        && payload.origin.is_none()
        && payload.destination.is_none()
        && payload.date_start.is_none()
        && payload.date_end.is_none();
    if nothing_to_update {
        let files = repo.list_files(id).await?;
        return Ok(Json(OrderResponse::from_model(existing, files)));
    }

    // The update must satisfy the same rules as a fresh order.
    let merged = NewOrder {
        info: payload.info.clone().unwrap_or_else(|| existing.info.clone()),
        weight: payload.weight.unwrap_or(existing.weight),
        length: payload.length.unwrap_or(existing.length),
        width: payload.width.unwrap_or(existing.width),
        height: payload.height.unwrap_or(existing.height),
        origin: payload
            .origin
            .clone()
            .unwrap_or_else(|| existing.origin.clone()),
        destination: payload
            .destination
            .clone()
            .unwrap_or_else(|| existing.destination.clone()),
        date_start: payload.date_start.unwrap_or(existing.date_start),
        date_end: payload.date_end.unwrap_or(existing.date_end),
    };
    OrderService::validate(&merged)?;

    let mut active = order::ActiveModel {
        id: Set(id),
        ..Default::default()
    };
    if let Some(info) = payload.info {
        active.info = Set(info);
    }
    if let Some(weight) = payload.weight {
        active.weight = Set(weight);
    }
    if let Some(length) = payload.length {
        active.length = Set(length);
    }
    if let Some(width) = payload.width {
        active.width = Set(width);
    }
    if let Some(height) = payload.height {
        active.height = Set(height);
    }
    if let Some(origin) = payload.origin {
        active.origin = Set(origin);
    }
    if let Some(destination) = payload.destination {
        active.destination = Set(destination);
    }
    if let Some(date) = payload.date_start {
        active.date_start = Set(date);
    }
    if let Some(date) = payload.date_end {
        active.date_end = Set(date);
    }

    let updated = repo.update(active).await?;
    let files = repo.list_files(id).await?;

    Ok(Json(OrderResponse::from_model(updated, files)))
}

pub async fn set_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<SetStatusRequest>,
) -> AppResult<Json<OrderResponse>> {
    claims.authorize_admin()?;

    if status::name(payload.status_id).is_none() {
        return Err(AppError::BadRequest("Unknown status".to_string()));
    }

    let repo = order_repo(&state)?;
    repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    let updated = repo
        .update(order::ActiveModel {
            id: Set(id),
            status_id: Set(payload.status_id),
            ..Default::default()
        })
        .await?;
    tracing::info!("Order {} moved to status {}", id, payload.status_id);

    Ok(Json(OrderResponse::from_model(updated, Vec::new())))
}

pub async fn delete_order(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let repo = order_repo(&state)?;
    load_authorized(repo.as_ref(), &claims, id).await?;

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_files(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<file::FileMeta>>> {
    let repo = order_repo(&state)?;
    load_authorized(repo.as_ref(), &claims, id).await?;

    Ok(Json(repo.list_files(id).await?))
}

pub async fn upload_files(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Vec<file::FileMeta>>)> {
    let repo = order_repo(&state)?;
    load_authorized(repo.as_ref(), &claims, id).await?;

    let (_, files) = collect_multipart(&mut multipart).await?;
    if files.is_empty() {
        return Err(AppError::BadRequest("No file parts in payload".to_string()));
    }

    let mut created = Vec::with_capacity(files.len());
    for new_file in files {
        let size = new_file.content.len() as i64;
        let stored = repo
            .add_file(file::ActiveModel {
                order_id: Set(id),
                name: Set(new_file.name),
                mime_type: Set(new_file.mime_type),
                content: Set(new_file.content),
                ..Default::default()
            })
            .await?;
        created.push(file::FileMeta {
            id: stored.id,
            order_id: stored.order_id,
            name: stored.name,
            mime_type: stored.mime_type,
            size,
        });
    }

    Ok((StatusCode::CREATED, Json(created)))
}

async fn load_file(
    repo: &dyn OrderRepository,
    claims: &Claims,
    order_id: i32,
    file_id: i32,
) -> AppResult<file::Model> {
    load_authorized(repo, claims, order_id).await?;

    let stored = repo
        .find_file(file_id)
        .await?
        .filter(|f| f.order_id == order_id)
        .ok_or(AppError::NotFound)?;
    Ok(stored)
}

pub async fn get_file(
    State(state): State<AppState>,
    claims: Claims,
    Path((id, file_id)): Path<(i32, i32)>,
) -> AppResult<Json<FileContentResponse>> {
    let repo = order_repo(&state)?;
    let stored = load_file(repo.as_ref(), &claims, id, file_id).await?;

    Ok(Json(FileContentResponse {
        id: stored.id,
        order_id: stored.order_id,
        name: stored.name,
        mime_type: stored.mime_type,
        content: BASE64.encode(stored.content),
    }))
}

pub async fn download_file(
    State(state): State<AppState>,
    claims: Claims,
    Path((id, file_id)): Path<(i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let repo = order_repo(&state)?;
    let stored = load_file(repo.as_ref(), &claims, id, file_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, stored.mime_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", stored.name.replace('"', "")),
            ),
        ],
        stored.content,
    ))
}

pub async fn delete_file(
    State(state): State<AppState>,
    claims: Claims,
    Path((id, file_id)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    let repo = order_repo(&state)?;
    load_file(repo.as_ref(), &claims, id, file_id).await?;

    repo.delete_file(file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::repositories::init_repo_manager;
    use crate::modules::auth::service::TokenKind;
    use crate::modules::users::entities::role;
    use crate::shared::config::Config;
    use chrono::{NaiveDate, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            database_max_connections: 1,
            database_min_connections: 1,
            database_connect_timeout: 1,
            database_idle_timeout: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            rust_log: "info".to_string(),
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
        }
    }

    fn owner_claims(user_id: i32) -> Claims {
        Claims {
            sub: user_id,
            role_id: role::USER,
            typ: TokenKind::Access,
            exp: 0,
            iat: 0,
        }
    }

    fn stored_order(id: i32, user_id: i32) -> order::Model {
        order::Model {
            id,
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
            user_id,
        }
    }

    fn state_with(db: sea_orm::DatabaseConnection) -> AppState {
        AppState {
            config: Arc::new(test_config()),
            repo_manager: init_repo_manager(Arc::new(db)),
        }
    }

    fn empty_patch() -> UpdateOrderRequest {
        UpdateOrderRequest {
            info: None,
            weight: None,
            length: None,
            width: None,
            height: None,
            origin: None,
            destination: None,
            date_start: None,
            date_end: None,
        }
    }

    #[tokio::test]
    async fn update_rejects_blank_origin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_order(11, 3)]])
            .into_connection();
        let state = state_with(db);

        let payload = UpdateOrderRequest {
            origin: Some("   ".to_string()),
            ..empty_patch()
        };
        let err = update_order(State(state), owner_claims(3), Path(11), Json(payload))
            .await
            .expect_err("blank origin must be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_rejects_blank_info() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_order(11, 3)]])
            .into_connection();
        let state = state_with(db);

        let payload = UpdateOrderRequest {
            info: Some(String::new()),
            ..empty_patch()
        };
        let err = update_order(State(state), owner_claims(3), Path(11), Json(payload))
            .await
            .expect_err("blank info must be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn update_rejects_inverted_merged_dates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_order(11, 3)]])
            .into_connection();
        let state = state_with(db);

        // date_end before the stored date_start.
        let payload = UpdateOrderRequest {
            date_end: Some(NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")),
            ..empty_patch()
        };
        let err = update_order(State(state), owner_claims(3), Path(11), Json(payload))
            .await
            .expect_err("inverted range must be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
