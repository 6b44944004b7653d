//! Authentication module
//!
//! Credential verification, token issuance and token verification. The
//! rest of the service only ever sees a verified `AuthUser`.

pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::{AuthUser, Role};
use crate::error::AppError;

pub use token::TokenService;

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: LoginUser,
}

/// The user block echoed alongside the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// Login flow plus token verification for the guard.
#[derive(Debug, Clone)]
pub struct AuthService {
    pool: PgPool,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: TokenService) -> Self {
        Self { pool, tokens }
    }

    /// Verify a username/password pair and issue a token. Unknown user and
    /// wrong password are indistinguishable to the caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let row: Option<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, username, password_hash, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let (id, username, password_hash, role) = row.ok_or_else(invalid)?;

        if !password::verify_password(password, &password_hash) {
            return Err(invalid());
        }

        let role: Role = role
            .parse()
            .map_err(|_| AppError::Internal(format!("user {} has unknown role", id)))?;

        let access_token = self.tokens.issue(id, &username, role)?;

        Ok(LoginResponse {
            access_token,
            user: LoginUser { id, username, role },
        })
    }

    /// Verify a bearer token and return the caller it identifies.
    pub fn verify_token(&self, token: &str) -> Result<AuthUser, AppError> {
        self.tokens.verify(token)
    }
}
