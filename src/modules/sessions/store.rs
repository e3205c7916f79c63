//! Durable session records, keyed by token fingerprint and by owner.
//!
//! All functions take an [`sqlx::PgExecutor`] so callers can run them either
//! against the pool or inside a transaction (refresh rebinds old and new
//! sessions atomically).

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::model::Session;
use crate::utils::errors::AppError;

/// Names of the constraints the `create` path discriminates on. Must match
/// the migration.
const TOKEN_HASH_UNIQUE: &str = "user_sessions_token_hash_key";
const ONE_LIVE_PER_USER: &str = "uniq_user_sessions_one_live";

/// Why an insert was refused. The caller decides which of these is a policy
/// outcome and which is fatal.
#[derive(Debug)]
pub enum CreateSessionError {
    /// The partial unique index rejected a second live session for the same
    /// owner; a concurrent login won the race.
    LiveSessionExists,
    /// Token fingerprint collision. Fingerprints derive from fresh signed
    /// tokens, so this indicates a bug or an attack, not a business case.
    DuplicateFingerprint,
    Db(sqlx::Error),
}

pub struct SessionStore;

impl SessionStore {
    pub async fn create(
        db: impl PgExecutor<'_>,
        user_id: Uuid,
        token: &str,
        token_hash: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<Session, CreateSessionError> {
        let result = sqlx::query_as::<_, Session>(
            "INSERT INTO user_sessions (user_id, token, token_hash, ip_address, user_agent, last_activity)
             VALUES ($1, $2, $3, $4, $5, NOW())
             RETURNING id, user_id, token, token_hash, ip_address, user_agent, last_activity, is_active, created_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(token_hash)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(db)
        .await;

        result.map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                match db_err.constraint() {
                    Some(TOKEN_HASH_UNIQUE) => return CreateSessionError::DuplicateFingerprint,
                    Some(ONE_LIVE_PER_USER) => return CreateSessionError::LiveSessionExists,
                    _ => {}
                }
            }
            CreateSessionError::Db(err)
        })
    }

    /// All live sessions for an owner, newest first. Expiry is not applied
    /// here; stale rows stay live until a reap marks them dead.
    pub async fn find_live_by_owner(
        db: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<Vec<Session>, AppError> {
        sqlx::query_as::<_, Session>(
            "SELECT id, user_id, token, token_hash, ip_address, user_agent, last_activity, is_active, created_at
             FROM user_sessions
             WHERE user_id = $1 AND is_active = TRUE
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch live sessions")
        .map_err(AppError::database)
    }

    pub async fn find_live_by_fingerprint(
        db: impl PgExecutor<'_>,
        token_hash: &str,
    ) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>(
            "SELECT id, user_id, token, token_hash, ip_address, user_agent, last_activity, is_active, created_at
             FROM user_sessions
             WHERE token_hash = $1 AND is_active = TRUE",
        )
        .bind(token_hash)
        .fetch_optional(db)
        .await
        .context("Failed to look up session by fingerprint")
        .map_err(AppError::database)
    }

    /// Marks one session dead. Idempotent: unknown or already-dead
    /// fingerprints are not an error.
    pub async fn mark_dead(
        db: impl PgExecutor<'_>,
        token_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE
             WHERE token_hash = $1 AND is_active = TRUE",
        )
        .bind(token_hash)
        .execute(db)
        .await
        .context("Failed to deactivate session")
        .map_err(AppError::database)?;

        Ok(())
    }

    /// Marks every live session of an owner dead in a single statement, so
    /// it is all-or-nothing without an explicit transaction.
    pub async fn mark_all_dead_for_owner(
        db: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE
             WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .execute(db)
        .await
        .context("Failed to deactivate sessions")
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }

    /// Updates last-activity. Best effort: failures only cost observability,
    /// so they are logged and swallowed.
    pub async fn touch(db: impl PgExecutor<'_>, token_hash: &str, at: DateTime<Utc>) {
        let result = sqlx::query(
            "UPDATE user_sessions SET last_activity = $2
             WHERE token_hash = $1 AND is_active = TRUE",
        )
        .bind(token_hash)
        .bind(at)
        .execute(db)
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to update session activity");
        }
    }

    /// Marks dead every live session idle longer than `max_idle_secs`.
    /// Returns how many were affected. Rows are kept for audit.
    pub async fn purge_expired(
        db: impl PgExecutor<'_>,
        now: DateTime<Utc>,
        max_idle_secs: i64,
    ) -> Result<u64, AppError> {
        let cutoff = now - chrono::Duration::seconds(max_idle_secs);

        let result = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE
             WHERE is_active = TRUE AND last_activity < $1",
        )
        .bind(cutoff)
        .execute(db)
        .await
        .context("Failed to purge expired sessions")
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }

    /// Bounded variant of [`Self::purge_expired`] touching only one owner's
    /// rows, run inline before a login so stale liveness flags cannot block
    /// a legitimate re-login.
    pub async fn purge_expired_for_owner(
        db: impl PgExecutor<'_>,
        user_id: Uuid,
        now: DateTime<Utc>,
        max_idle_secs: i64,
    ) -> Result<u64, AppError> {
        let cutoff = now - chrono::Duration::seconds(max_idle_secs);

        let result = sqlx::query(
            "UPDATE user_sessions SET is_active = FALSE
             WHERE user_id = $1 AND is_active = TRUE AND last_activity < $2",
        )
        .bind(user_id)
        .bind(cutoff)
        .execute(db)
        .await
        .context("Failed to purge expired sessions for user")
        .map_err(AppError::database)?;

        Ok(result.rows_affected())
    }
}
