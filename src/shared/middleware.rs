use axum::{extract::Request, middleware::Next, response::Response};

use crate::modules::auth::service::Claims;
use crate::shared::error::AppResult;

pub async fn require_admin(claims: Claims, request: Request, next: Next) -> AppResult<Response> {
    claims.authorize_admin()?;
    Ok(next.run(request).await)
}
