use anyhow::{Context, anyhow};
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{User, UserWithPassword};
use crate::utils::errors::AppError;

pub struct UserService;

impl UserService {
    /// Looks up a user by email for credential verification. Soft-deleted
    /// users are invisible.
    pub async fn find_by_email(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<UserWithPassword>, AppError> {
        sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, name, username, email, password, last_login_at, last_login_ip, created_at
             FROM users
             WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by email")
        .map_err(AppError::database)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, username, email, last_login_at, last_login_ip, created_at
             FROM users
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by id")
        .map_err(AppError::database)
    }

    pub async fn email_or_username_taken(
        db: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<bool, AppError> {
        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users
             WHERE (email = $1 OR username = $2) AND deleted_at IS NULL",
        )
        .bind(email)
        .bind(username)
        .fetch_optional(db)
        .await
        .context("Failed to check for existing user")
        .map_err(AppError::database)?;

        Ok(existing.is_some())
    }

    /// Inserts a new user. The email/username unique constraints settle
    /// races between concurrent registrations; a violation surfaces as the
    /// same 422 the pre-insert check produces.
    pub async fn create(
        db: &PgPool,
        name: &str,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, username, email, password)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, username, email, last_login_at, last_login_ip, created_at",
        )
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                if matches!(
                    db_err.constraint(),
                    Some("users_email_key") | Some("users_username_key")
                ) {
                    return AppError::unprocessable(anyhow!("Email or username already taken"));
                }
            }
            AppError::database(anyhow::Error::new(err).context("Failed to insert user"))
        })
    }

    /// Records last-login time and origin. Best effort: a failure here must
    /// not fail the login itself.
    pub async fn update_last_login(db: &PgPool, id: Uuid, ip: &str) {
        let result = sqlx::query(
            "UPDATE users SET last_login_at = NOW(), last_login_ip = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ip)
        .execute(db)
        .await;

        if let Err(err) = result {
            tracing::warn!(user_id = %id, error = %err, "failed to record last login");
        }
    }
}
