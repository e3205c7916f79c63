use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::sessions::model::SessionView;
use crate::modules::users::model::User;

// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    /// Unique token id. Two logins in the same second must still produce
    /// distinct tokens, and therefore distinct fingerprints.
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token TTL in seconds.
    pub expires_in: i64,
    pub user: User,
}

impl LoginResponse {
    pub fn new(access_token: String, expires_in: i64, user: User) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
            user,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IsLoggedInResponse {
    pub is_logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_sessions: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveSessionsResponse {
    pub sessions: Vec<SessionView>,
    pub total_active_sessions: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginInfoResponse {
    pub name: String,
    pub email: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub current_ip: String,
    /// Minutes since last login, if known.
    pub login_duration: Option<i64>,
    pub active_sessions_count: i64,
}
