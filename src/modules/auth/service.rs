use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::modules::auth::password;
use crate::modules::users::entities::{role, user};
use crate::modules::users::repository::UserRepository;
use crate::shared::config::Config;
use crate::shared::error::{AppError, AppResult};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // User id
    pub role_id: i32,
    pub typ: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role_id == role::ADMIN
    }

    /// The access rule applied across user, order and file endpoints:
    /// admins may touch anything, everyone else only what they own.
    pub fn authorize_owner(&self, owner_id: i32) -> AppResult<()> {
        if self.is_admin() || self.sub == owner_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Access denied".to_string()))
        }
    }

    pub fn authorize_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub phone: String,
    pub password: String,
}

pub struct AuthService;

impl AuthService {
    pub async fn register(
        user_repo: &dyn UserRepository,
        payload: RegisterRequest,
    ) -> AppResult<user::Model> {
        if !payload.email.contains('@') {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if payload.phone.trim().is_empty() {
            return Err(AppError::BadRequest("Phone number is required".to_string()));
        }
        if payload.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if user_repo.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let now = Utc::now().naive_utc();
        let new_user = user::ActiveModel {
            email: Set(payload.email),
            phone: Set(payload.phone),
            password_hash: Set(password::hash_password(&payload.password)?),
            role_id: Set(role::USER),
            created_at: Set(now),
            ..Default::default()
        };

        user_repo.create(new_user).await
    }

    pub async fn login(
        user_repo: &dyn UserRepository,
        config: &Config,
        email: &str,
        password_input: &str,
    ) -> AppResult<TokenPair> {
        let user = user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ))?;

        if !password::verify_password(password_input, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        Self::issue_token_pair(config, &user)
    }

    pub async fn refresh(
        user_repo: &dyn UserRepository,
        config: &Config,
        refresh_token: &str,
    ) -> AppResult<TokenPair> {
        let claims = Self::decode_token(config, refresh_token, TokenKind::Refresh)?;

        // Re-read the user so a role change or deletion invalidates old refresh tokens.
        let user = user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::Unauthorized("User no longer exists".to_string()))?;

        Self::issue_token_pair(config, &user)
    }

    pub fn issue_token_pair(config: &Config, user: &user::Model) -> AppResult<TokenPair> {
        let access_token = Self::generate_token(
            config,
            user,
            TokenKind::Access,
            Duration::minutes(config.access_token_ttl_minutes),
        )?;
        let refresh_token = Self::generate_token(
            config,
            user,
            TokenKind::Refresh,
            Duration::days(config.refresh_token_ttl_days),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn decode_token(config: &Config, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if token_data.claims.typ != expected {
            return Err(AppError::Unauthorized("Wrong token type".to_string()));
        }

        Ok(token_data.claims)
    }

    fn generate_token(
        config: &Config,
        user: &user::Model,
        kind: TokenKind,
        ttl: Duration,
    ) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or(AppError::InternalServerError(
                "Token expiry overflow".to_string(),
            ))?
            .timestamp() as usize;

        let claims = Claims {
            sub: user.id,
            role_id: user.role_id,
            typ: kind,
            exp: expiration,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalServerError(format!("JWT generation failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::infra::persistence::PostgresUserRepository;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

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

    fn test_user(id: i32, role_id: i32) -> user::Model {
        user::Model {
            id,
            email: format!("user{}@example.com", id),
            phone: "+10000000000".to_string(),
            password_hash: String::new(),
            role_id,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![test_user(7, role::USER)]])
                .into_connection(),
        );
        let repo = PostgresUserRepository::new(db);

        let err = AuthService::register(
            &repo,
            RegisterRequest {
                email: "user7@example.com".to_string(),
                phone: "+10000000000".to_string(),
                password: "long-enough-password".to_string(),
            },
        )
        .await
        .expect_err("existing email must conflict");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_forces_user_role() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([vec![test_user(8, role::USER)]])
                .into_connection(),
        );
        let repo = PostgresUserRepository::new(db);

        let created = AuthService::register(
            &repo,
            RegisterRequest {
                email: "user8@example.com".to_string(),
                phone: "+10000000000".to_string(),
                password: "long-enough-password".to_string(),
            },
        )
        .await
        .expect("registration succeeds");
        assert_eq!(created.role_id, role::USER);
        assert_eq!(created.email, "user8@example.com");
    }

    #[test]
    fn token_pair_round_trip() {
        let config = test_config();
        let user = test_user(42, role::USER);

        let pair = AuthService::issue_token_pair(&config, &user).expect("tokens issued");
        let claims = AuthService::decode_token(&config, &pair.access_token, TokenKind::Access)
            .expect("access token decodes");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role_id, role::USER);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let config = test_config();
        let user = test_user(1, role::USER);

        let pair = AuthService::issue_token_pair(&config, &user).expect("tokens issued");
        let err = AuthService::decode_token(&config, &pair.refresh_token, TokenKind::Access)
            .expect_err("refresh token must be rejected as access");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut config = test_config();
        config.access_token_ttl_minutes = -5;
        let user = test_user(1, role::USER);

        let pair = AuthService::issue_token_pair(&config, &user).expect("tokens issued");
        assert!(AuthService::decode_token(&config, &pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn tampered_secret_is_rejected() {
        let config = test_config();
        let user = test_user(1, role::ADMIN);
        let pair = AuthService::issue_token_pair(&config, &user).expect("tokens issued");

        let mut other = test_config();
        other.jwt_secret = "other-secret".to_string();
        assert!(AuthService::decode_token(&other, &pair.access_token, TokenKind::Access).is_err());
    }

    #[test]
    fn admin_or_owner_rule() {
        let admin = Claims {
            sub: 1,
            role_id: role::ADMIN,
            typ: TokenKind::Access,
            exp: 0,
            iat: 0,
        };
        let owner = Claims {
            sub: 5,
            role_id: role::USER,
            typ: TokenKind::Access,
            exp: 0,
            iat: 0,
        };

        assert!(admin.authorize_owner(5).is_ok());
        assert!(admin.authorize_admin().is_ok());
        assert!(owner.authorize_owner(5).is_ok());
        assert!(matches!(
            owner.authorize_owner(6),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            owner.authorize_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
