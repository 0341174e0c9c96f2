use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::modules::auth::password;
use crate::modules::auth::service::{Claims, MIN_PASSWORD_LEN};
use crate::modules::users::entities::user;
use crate::modules::users::repository::UserRepository;
use crate::shared::{
    error::{AppError, AppResult},
    state::AppState,
};
use std::sync::Arc;

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub phone: String,
    pub role_id: i32,
    pub created_at: chrono::NaiveDateTime,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            role_id: user.role_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: String,
}

fn user_repo(state: &AppState) -> AppResult<Arc<dyn UserRepository>> {
    state
        .repo_manager
        .get::<Arc<dyn UserRepository>>()
        .cloned()
        .ok_or(AppError::InternalServerError(
            "UserRepository not registered".to_string(),
        ))
}

pub async fn list_users(
    State(state): State<AppState>,
    claims: Claims,
) -> AppResult<Json<Vec<UserResponse>>> {
    claims.authorize_admin()?;

    let repo = user_repo(&state)?;
    let users = repo.list_all().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    claims.authorize_owner(id)?;

    let repo = user_repo(&state)?;
    let user = repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    claims.authorize_owner(id)?;

    // Role changes are admin-only, even on one's own account.
    if payload.role_id.is_some() && !claims.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can change roles".to_string(),
        ));
    }

    let repo = user_repo(&state)?;
    let existing = repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    if payload.email.is_none() && payload.phone.is_none() && payload.role_id.is_none() {
        return Ok(Json(existing.into()));
    }

    let mut active = user::ActiveModel {
        id: Set(id),
        ..Default::default()
    };

    if let Some(email) = payload.email {
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if let Some(other) = repo.find_by_email(&email).await? {
            if other.id != id {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        if phone.trim().is_empty() {
            return Err(AppError::BadRequest("Phone number is required".to_string()));
        }
        active.phone = Set(phone);
    }
    if let Some(role_id) = payload.role_id {
        if role_id != crate::modules::users::entities::role::ADMIN
            && role_id != crate::modules::users::entities::role::USER
        {
            return Err(AppError::BadRequest("Unknown role".to_string()));
        }
        active.role_id = Set(role_id);
    }

    let updated = repo.update(active).await?;

    Ok(Json(updated.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    claims.authorize_owner(id)?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let repo = user_repo(&state)?;
    let user = repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    // Admins may reset without the current password, owners must supply it.
    if !claims.is_admin() {
        let current = payload.current_password.as_deref().ok_or(
            AppError::BadRequest("Current password is required".to_string()),
        )?;
        if !password::verify_password(current, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
    }

    let active = user::ActiveModel {
        id: Set(id),
        password_hash: Set(password::hash_password(&payload.new_password)?),
        ..Default::default()
    };
    repo.update(active).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.authorize_owner(id)?;

    let repo = user_repo(&state)?;
    if !repo.delete(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}
