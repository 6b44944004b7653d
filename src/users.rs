//! User directory
//!
//! Account records live here; the ledger core only references them by id.
//! Passwords are hashed before they reach the table and never leave it.

use sqlx::PgPool;

use crate::auth::password::hash_password;
use crate::domain::{Role, UserInfo};
use crate::error::AppError;

type UserRow = (i64, String, String, chrono::DateTime<chrono::Utc>);

fn row_to_user(row: UserRow) -> Result<UserInfo, AppError> {
    let (id, username, role, created_at) = row;
    let role = role
        .parse()
        .map_err(|_| AppError::Internal(format!("user {} has unknown role", id)))?;

    Ok(UserInfo {
        id,
        username,
        role,
        created_at,
    })
}

#[derive(Debug, Clone)]
pub struct UserDirectory {
    pool: PgPool,
}

impl UserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All accounts, newest first. Password hashes are never selected.
    pub async fn list(&self) -> Result<Vec<UserInfo>, AppError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, role, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_user).collect()
    }

    /// Create an account. A duplicate username is rejected without a
    /// second account being created; the unique constraint backs the
    /// pre-check against concurrent creations.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<UserInfo, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation(
                "username must not be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::Validation(
                "password must not be empty".to_string(),
            ));
        }

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        if existing.is_some() {
            return Err(AppError::Validation("Username already exists".to_string()));
        }

        let password_hash = hash_password(password)?;

        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, role, created_at
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("Username already exists".to_string())
            }
            _ => AppError::Storage(e),
        })?;

        row_to_user(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_user() {
        let row: UserRow = (
            1,
            "admin".to_string(),
            "admin".to_string(),
            "2024-01-01T00:00:00Z".parse().unwrap(),
        );

        let user = row_to_user(row).unwrap();
        assert_eq!(user.username, "admin");
        assert!(user.role.is_admin());
    }

    #[test]
    fn test_row_to_user_rejects_unknown_role() {
        let row: UserRow = (
            2,
            "bob".to_string(),
            "superuser".to_string(),
            "2024-01-01T00:00:00Z".parse().unwrap(),
        );

        assert!(matches!(row_to_user(row), Err(AppError::Internal(_))));
    }
}
