use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One row of the `user_sessions` table: a single issued token and its
/// liveness. Rows are never deleted, only flipped to `is_active = false`.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Raw token, kept for revocation lookup. Never serialized.
    pub token: String,
    /// SHA-256 hex of the raw token; the unique, indexed key.
    pub token_hash: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a session. Deliberately excludes the token, its
/// fingerprint and the row id.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            last_activity: session.last_activity,
            created_at: session.created_at,
        }
    }
}
