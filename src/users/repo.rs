use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{on_unique, AppError, AppResult};
use crate::users::role::Role;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub avatar_key: Option<String>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, avatar_key, created_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Inserts a new user. Uniqueness is enforced by the database so that
    /// concurrent registrations cannot both succeed; constraint violations
    /// surface as `Duplicate`.
    pub async fn insert(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::Duplicate("email")
            }
            _ => on_unique(e, "users_username_key", "username"),
        })?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_active(db: &PgPool, id: Uuid, active: bool) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(active)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        username: &str,
        email: &str,
        password_hash: &str,
        avatar_key: Option<&str>,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, avatar_key = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(avatar_key)
        .fetch_one(db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.constraint() == Some("users_email_key") => {
                AppError::Duplicate("email")
            }
            _ => on_unique(e, "users_username_key", "username"),
        })?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
