//! Session-exclusivity policy: a user holds at most one live session.
//!
//! The guard runs the friendly check-then-act sequence (reap the owner's
//! stale sessions, look for live ones, insert) and relies on the partial
//! unique index `uniq_user_sessions_one_live` to decide races between
//! concurrent logins for the same owner. Logins for different owners never
//! contend.

use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{Session, SessionView};
use super::store::{CreateSessionError, SessionStore};
use crate::config::session::SessionConfig;
use crate::utils::errors::AppError;

/// Outcome of a refused or failed login attempt.
#[derive(Debug)]
pub enum SessionError {
    /// The owner already holds a live session. The token minted for this
    /// attempt must be discarded by the caller and never reach the client.
    AlreadyLoggedIn { active_sessions: i64 },
    /// Fingerprint collision on insert. Fatal integrity violation.
    DuplicateFingerprint,
    Storage(AppError),
}

impl From<AppError> for SessionError {
    fn from(err: AppError) -> Self {
        SessionError::Storage(err)
    }
}

pub struct SessionGuard;

impl SessionGuard {
    /// Registers a session for a freshly issued token, enforcing the
    /// exclusivity invariant.
    ///
    /// Of any set of concurrent attempts for the same owner at most one
    /// returns `Ok`; the rest observe [`SessionError::AlreadyLoggedIn`].
    #[instrument(skip(db, token, token_hash))]
    pub async fn attempt_login(
        db: &PgPool,
        config: &SessionConfig,
        user_id: Uuid,
        token: &str,
        token_hash: &str,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<Session, SessionError> {
        // Stale liveness flags must not block a legitimate re-login.
        let reaped =
            SessionStore::purge_expired_for_owner(db, user_id, Utc::now(), config.max_idle_secs)
                .await?;
        if reaped > 0 {
            tracing::debug!(user_id = %user_id, reaped, "reaped idle sessions before login");
        }

        let live = SessionStore::find_live_by_owner(db, user_id).await?;
        if !live.is_empty() {
            return Err(SessionError::AlreadyLoggedIn {
                active_sessions: live.len() as i64,
            });
        }

        match SessionStore::create(db, user_id, token, token_hash, ip_address, user_agent).await {
            Ok(session) => Ok(session),
            Err(CreateSessionError::LiveSessionExists) => {
                // Lost the race to a concurrent login for the same owner.
                let count = Self::active_count(db, user_id).await.unwrap_or(1);
                Err(SessionError::AlreadyLoggedIn {
                    active_sessions: count.max(1),
                })
            }
            Err(CreateSessionError::DuplicateFingerprint) => {
                tracing::error!(user_id = %user_id, "token fingerprint collision on session create");
                Err(SessionError::DuplicateFingerprint)
            }
            Err(CreateSessionError::Db(err)) => Err(SessionError::Storage(AppError::database(err))),
        }
    }

    /// Revokes the session holding this fingerprint. Idempotent: revoking an
    /// unknown or already-dead session succeeds silently.
    pub async fn logout(db: &PgPool, token_hash: &str) -> Result<(), AppError> {
        SessionStore::mark_dead(db, token_hash).await
    }

    /// Marks every live session of the owner dead. A single UPDATE, so the
    /// storage layer makes it all-or-nothing.
    #[instrument(skip(db))]
    pub async fn logout_everywhere(db: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = SessionStore::mark_all_dead_for_owner(db, user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "logged out from all devices");
        Ok(revoked)
    }

    pub async fn active_count(db: &PgPool, user_id: Uuid) -> Result<i64, AppError> {
        let sessions = SessionStore::find_live_by_owner(db, user_id).await?;
        Ok(sessions.len() as i64)
    }

    /// Live sessions as client-safe views: origin and timestamps only, no
    /// token material.
    pub async fn list_active(db: &PgPool, user_id: Uuid) -> Result<Vec<SessionView>, AppError> {
        let sessions = SessionStore::find_live_by_owner(db, user_id).await?;
        Ok(sessions.into_iter().map(SessionView::from).collect())
    }

    /// Liveness gate for authenticated requests: a verified token is only
    /// usable while its session row is live.
    pub async fn check_live(db: &PgPool, token_hash: &str) -> Result<Option<Session>, AppError> {
        SessionStore::find_live_by_fingerprint(db, token_hash).await
    }

    /// Best-effort last-activity update for the presenting session.
    pub async fn touch(db: &PgPool, token_hash: &str) {
        SessionStore::touch(db, token_hash, Utc::now()).await;
    }
}
